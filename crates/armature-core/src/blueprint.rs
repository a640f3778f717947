//! Service blueprints.
//!
//! A blueprint is a fully resolved construction recipe for one service: which
//! type to build, how to call it, and the lifecycle flags the runtime should
//! honour. Blueprints are never instantiated here.
//!
//! Every registry entry is a [`ServiceEntry`]:
//!
//! - [`ServiceEntry::Alias`] redirects one identifier to another.
//! - [`ServiceEntry::Blueprint`] is a standalone recipe.
//! - [`ServiceEntry::Child`] inherits from a named parent and is completed by
//!   the runtime; container-wide defaults never apply to it.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
};

use indexmap::IndexMap;

use crate::{
    argument::{Arguments, Reference},
    scalar::Scalar,
};

/// Method name that marks constructor autowiring.
pub const CONSTRUCTOR: &str = "__construct";

/// An identifier redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    target: String,
    public: bool,
}

impl Alias {
    pub fn new(target: impl Into<String>, public: bool) -> Self {
        Self {
            target: target.into(),
            public,
        }
    }

    /// Get the identifier this alias points at.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_public(&self) -> bool {
        self.public
    }
}

/// What a factory or configurator is called on.
#[derive(Debug, Clone, PartialEq)]
pub enum CallableTarget {
    /// No target given; the runtime supplies one.
    None,
    /// Static call on a class.
    Class(String),
    /// Call on another service.
    Service(Reference),
    /// Call on a service declared inline.
    Inline(Box<ServiceEntry>),
}

/// A factory or configurator descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Callable {
    /// Plain function name.
    Function(String),
    /// `[target, method]` pair.
    Method {
        target: CallableTarget,
        method: String,
    },
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(name) => write!(f, "{name}()"),
            Self::Method { target, method } => match target {
                CallableTarget::None => write!(f, "?::{method}"),
                CallableTarget::Class(class) => write!(f, "{class}::{method}"),
                CallableTarget::Service(reference) => write!(f, "{reference}::{method}"),
                CallableTarget::Inline(_) => write!(f, "<inline>::{method}"),
            },
        }
    }
}

/// A method call performed after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    method: String,
    arguments: Arguments,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}

/// A named tag with its attribute parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    name: String,
    parameters: IndexMap<String, Scalar>,
}

impl Tag {
    pub fn new(name: impl Into<String>, parameters: IndexMap<String, Scalar>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &IndexMap<String, Scalar> {
        &self.parameters
    }

    /// Get a single parameter value.
    pub fn parameter(&self, key: &str) -> Option<&Scalar> {
        self.parameters.get(key)
    }
}

/// Marks a blueprint as wrapping another service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    decorated_id: String,
    inner_name: Option<String>,
    priority: i64,
}

impl Decoration {
    pub fn new(decorated_id: impl Into<String>, inner_name: Option<String>, priority: i64) -> Self {
        Self {
            decorated_id: decorated_id.into(),
            inner_name,
            priority,
        }
    }

    /// Identifier of the decorated service.
    pub fn decorated_id(&self) -> &str {
        &self.decorated_id
    }

    /// New identifier for the decorated instance, if renamed.
    pub fn inner_name(&self) -> Option<&str> {
        self.inner_name.as_deref()
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }
}

/// A construction recipe for one service.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    class: Option<String>,
    public: Option<bool>,
    shared: bool,
    synthetic: bool,
    lazy: bool,
    is_abstract: bool,
    autowired_methods: Vec<String>,
    autowiring_types: Vec<String>,
    file: Option<String>,
    deprecated: bool,
    deprecation_message: Option<String>,
    arguments: Arguments,
    properties: Arguments,
    factory: Option<Callable>,
    configurator: Option<Callable>,
    method_calls: Vec<MethodCall>,
    tags: Vec<Tag>,
    decoration: Option<Decoration>,
    source: Option<PathBuf>,
}

impl Default for Blueprint {
    fn default() -> Self {
        Self {
            class: None,
            public: None,
            shared: true,
            synthetic: false,
            lazy: false,
            is_abstract: false,
            autowired_methods: Vec::new(),
            autowiring_types: Vec::new(),
            file: None,
            deprecated: false,
            deprecation_message: None,
            arguments: Arguments::new(),
            properties: Arguments::new(),
            factory: None,
            configurator: None,
            method_calls: Vec::new(),
            tags: Vec::new(),
            decoration: None,
            source: None,
        }
    }
}

impl Blueprint {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Get the class (or callable) name the service is built from.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Effective visibility; services are public unless made private.
    pub fn is_public(&self) -> bool {
        self.public.unwrap_or(true)
    }

    /// Visibility as explicitly set, `None` when left to the default.
    pub fn visibility(&self) -> Option<bool> {
        self.public
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Returns `true` if any method is marked for autowiring.
    pub fn is_autowired(&self) -> bool {
        !self.autowired_methods.is_empty()
    }

    /// Methods whose arguments the runtime should autowire.
    pub fn autowired_methods(&self) -> &[String] {
        &self.autowired_methods
    }

    pub fn autowiring_types(&self) -> &[String] {
        &self.autowiring_types
    }

    /// File to include before building the service.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn deprecation_message(&self) -> Option<&str> {
        self.deprecation_message.as_deref()
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn properties(&self) -> &Arguments {
        &self.properties
    }

    pub fn factory(&self) -> Option<&Callable> {
        self.factory.as_ref()
    }

    pub fn configurator(&self) -> Option<&Callable> {
        self.configurator.as_ref()
    }

    pub fn method_calls(&self) -> &[MethodCall] {
        &self.method_calls
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns `true` if a tag with this name is attached.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name() == name)
    }

    pub fn decoration(&self) -> Option<&Decoration> {
        self.decoration.as_ref()
    }

    /// The document this blueprint was declared in.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    pub fn set_class(&mut self, class: impl Into<String>) {
        self.class = Some(class.into());
    }

    pub fn set_public(&mut self, public: bool) {
        self.public = Some(public);
    }

    pub fn set_shared(&mut self, shared: bool) {
        self.shared = shared;
    }

    pub fn set_synthetic(&mut self, synthetic: bool) {
        self.synthetic = synthetic;
    }

    pub fn set_lazy(&mut self, lazy: bool) {
        self.lazy = lazy;
    }

    pub fn set_abstract(&mut self, is_abstract: bool) {
        self.is_abstract = is_abstract;
    }

    /// Toggle constructor autowiring.
    ///
    /// `true` replaces the autowired methods with the constructor marker,
    /// `false` clears them.
    pub fn set_autowired(&mut self, autowired: bool) {
        self.autowired_methods = if autowired {
            vec![CONSTRUCTOR.to_string()]
        } else {
            Vec::new()
        };
    }

    pub fn set_autowired_methods(&mut self, methods: Vec<String>) {
        self.autowired_methods = methods;
    }

    pub fn add_autowiring_type(&mut self, type_name: impl Into<String>) {
        self.autowiring_types.push(type_name.into());
    }

    pub fn set_file(&mut self, file: impl Into<String>) {
        self.file = Some(file.into());
    }

    pub fn set_deprecated(&mut self, deprecated: bool, message: Option<String>) {
        self.deprecated = deprecated;
        self.deprecation_message = message;
    }

    pub fn set_arguments(&mut self, arguments: Arguments) {
        self.arguments = arguments;
    }

    pub fn set_properties(&mut self, properties: Arguments) {
        self.properties = properties;
    }

    pub fn set_factory(&mut self, factory: Callable) {
        self.factory = Some(factory);
    }

    pub fn set_configurator(&mut self, configurator: Callable) {
        self.configurator = Some(configurator);
    }

    pub fn add_method_call(&mut self, call: MethodCall) {
        self.method_calls.push(call);
    }

    pub fn add_tag(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    pub fn set_decoration(&mut self, decoration: Decoration) {
        self.decoration = Some(decoration);
    }

    pub fn set_source(&mut self, source: impl Into<PathBuf>) {
        self.source = Some(source.into());
    }
}

/// A blueprint inheriting from a named parent service.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildBlueprint {
    parent: String,
    blueprint: Blueprint,
}

impl ChildBlueprint {
    pub fn new(parent: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            blueprint: Blueprint::new(),
        }
    }

    /// Wrap already resolved construction data as a child of `parent`.
    pub fn from_blueprint(parent: impl Into<String>, blueprint: Blueprint) -> Self {
        Self {
            parent: parent.into(),
            blueprint,
        }
    }

    /// Identifier of the parent service.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }
}

impl Deref for ChildBlueprint {
    type Target = Blueprint;

    fn deref(&self) -> &Self::Target {
        &self.blueprint
    }
}

impl DerefMut for ChildBlueprint {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.blueprint
    }
}

/// A registry entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEntry {
    Alias(Alias),
    Blueprint(Blueprint),
    Child(ChildBlueprint),
}

impl ServiceEntry {
    /// Construction data of a standalone or child blueprint.
    pub fn as_blueprint(&self) -> Option<&Blueprint> {
        match self {
            Self::Alias(_) => None,
            Self::Blueprint(blueprint) => Some(blueprint),
            Self::Child(child) => Some(child.blueprint()),
        }
    }

    /// Mutable construction data of a standalone or child blueprint.
    pub fn as_blueprint_mut(&mut self) -> Option<&mut Blueprint> {
        match self {
            Self::Alias(_) => None,
            Self::Blueprint(blueprint) => Some(blueprint),
            Self::Child(child) => Some(&mut child.blueprint),
        }
    }

    pub fn as_alias(&self) -> Option<&Alias> {
        match self {
            Self::Alias(alias) => Some(alias),
            _ => None,
        }
    }

    pub fn as_child(&self) -> Option<&ChildBlueprint> {
        match self {
            Self::Child(child) => Some(child),
            _ => None,
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias(_))
    }

    pub fn is_child(&self) -> bool {
        matches!(self, Self::Child(_))
    }

    /// Short name of the entry kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Alias(_) => "alias",
            Self::Blueprint(_) => "blueprint",
            Self::Child(_) => "child",
        }
    }
}

impl From<Blueprint> for ServiceEntry {
    fn from(blueprint: Blueprint) -> Self {
        Self::Blueprint(blueprint)
    }
}

impl From<ChildBlueprint> for ServiceEntry {
    fn from(child: ChildBlueprint) -> Self {
        Self::Child(child)
    }
}

impl From<Alias> for ServiceEntry {
    fn from(alias: Alias) -> Self {
        Self::Alias(alias)
    }
}
