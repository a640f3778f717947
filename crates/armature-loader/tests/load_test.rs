//! Integration tests for loading container documents from disk.

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

use armature_core::{
    argument::{ArgumentValue, InvalidBehavior},
    blueprint::{CONSTRUCTOR, Callable, CallableTarget},
    config_value::ConfigValue,
    scalar::Scalar,
};
use armature_loader::{
    ContainerBuilder, DeclaredExtension, Document, FileLocator, LoadReport, Loader, LoaderOptions,
    SchemaLocation, SchemaSource, SchemaValidator, StructuralValidator, XmlFileLoader,
    error::{ErrorCode, LoadError, Severity},
};

fn document(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<container xmlns="http://armature.dev/schema/dic/services"
           xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
           xmlns:acme="http://acme.dev/schema/dic/acme">
{body}
</container>"#
    )
}

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create directories");
    }
    fs::write(&path, document(body)).expect("write document");
    path.canonicalize().expect("canonical path")
}

fn loader(dir: &TempDir) -> XmlFileLoader {
    XmlFileLoader::new(FileLocator::new(vec![dir.path().to_path_buf()]))
}

fn load_into(
    loader: &XmlFileLoader,
    container: &mut ContainerBuilder,
    name: &str,
) -> Result<LoadReport, LoadError> {
    loader.load(name, container)
}

fn load(dir: &TempDir, name: &str) -> (ContainerBuilder, Result<LoadReport, LoadError>) {
    let mut container = ContainerBuilder::new();
    let result = load_into(&loader(dir), &mut container, name);
    (container, result)
}

fn error_code(result: Result<LoadReport, LoadError>) -> Option<ErrorCode> {
    let err = result.expect_err("load should fail");
    err.primary().and_then(|diagnostic| diagnostic.code())
}

fn anonymous_id(counter: usize, path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    format!("{counter}_{digest:x}")
}

#[test]
fn test_inline_service_is_flattened() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(
        &dir,
        "services.xml",
        r#"<services>
            <service id="a" class="App\A">
                <argument type="service" on-invalid="ignore">
                    <service class="App\B"/>
                </argument>
            </service>
        </services>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    result.expect("loads");

    let registry = container.registry();
    assert_eq!(registry.len(), 2);

    let anonymous = anonymous_id(1, &path);
    let a = registry.blueprint("a").expect("a is a blueprint");
    assert_eq!(a.class(), Some("App\\A"));
    let reference = a
        .arguments()
        .position(0)
        .and_then(ArgumentValue::as_reference)
        .expect("reference argument");
    assert_eq!(reference.id(), anonymous);
    assert_eq!(reference.invalid_behavior(), InvalidBehavior::Ignore);

    let b = registry.blueprint(&anonymous).expect("anonymous blueprint");
    assert_eq!(b.class(), Some("App\\B"));
    assert!(!b.is_public());
}

#[test]
fn test_named_and_anonymous_entries_are_counted() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services>
            <service id="mailer" class="App\Mailer">
                <argument type="service"><service class="App\Transport">
                    <argument type="service"><service class="App\Socket"/></argument>
                </service></argument>
                <property name="logger" type="service"><service class="App\Logger"/></property>
            </service>
            <service id="newsletter" class="App\Newsletter"/>
            <service id="mailer.alias" alias="mailer"/>
        </services>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    result.expect("loads");

    // 3 named entries + 3 inline services
    let registry = container.registry();
    assert_eq!(registry.len(), 6);
    let private = registry
        .definitions()
        .filter_map(|(_, entry)| entry.as_blueprint())
        .filter(|blueprint| !blueprint.is_public())
        .count();
    assert_eq!(private, 3);
}

#[test]
fn test_anonymous_ids_differ_across_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let body = r#"<services>
        <service id="x" class="App\X"><argument type="service"><service class="App\Y"/></argument></service>
    </services>"#;
    let first = write(&dir, "first.xml", body);
    let second = write(&dir, "second.xml", body);

    let loader = loader(&dir);
    let mut container = ContainerBuilder::new();
    load_into(&loader, &mut container, "first.xml").expect("first loads");
    load_into(&loader, &mut container, "second.xml").expect("second loads");

    assert!(container.registry().contains(&anonymous_id(1, &first)));
    assert!(container.registry().contains(&anonymous_id(1, &second)));
    assert_ne!(anonymous_id(1, &first), anonymous_id(1, &second));
}

#[test]
fn test_defaults_autowire_constructor() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services>
            <defaults autowire="true"/>
            <service id="a" class="App\A"/>
        </services>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    result.expect("loads");

    let a = container.registry().blueprint("a").expect("blueprint");
    assert_eq!(a.autowired_methods(), [CONSTRUCTOR.to_string()]);
}

#[test]
fn test_defaults_autowire_conflict() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services>
            <defaults autowire="true"><autowire>setX</autowire></defaults>
            <service id="a" class="App\A"/>
        </services>"#,
    );

    let (_, result) = load(&dir, "services.xml");
    assert_eq!(error_code(result), Some(ErrorCode::E100));
}

#[test]
fn test_alias_registration() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services>
            <service id="b" class="App\B"/>
            <service id="a" alias="b"/>
        </services>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    let report = result.expect("loads");
    assert!(!report.has_warnings());

    let alias = container.registry().alias("a").expect("alias");
    assert_eq!(alias.target(), "b");
    assert!(alias.is_public());
    assert!(container.registry().blueprint("a").is_none());
}

#[test]
fn test_alias_with_extra_attribute_warns() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services>
            <service id="b" class="App\B"/>
            <service id="a" alias="b" class="App\Ignored"/>
        </services>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    let report = result.expect("warnings do not fail the load");

    assert_eq!(report.warnings().len(), 1);
    let warning = &report.warnings()[0];
    assert_eq!(warning.severity(), Severity::Warning);
    assert_eq!(warning.code(), Some(ErrorCode::E300));
    assert_eq!(warning.service(), Some("a"));
    assert!(container.registry().alias("a").is_some());
}

#[test]
fn test_child_blueprint_skips_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services>
            <defaults public="false" autowire="true">
                <tag name="app.default"/>
            </defaults>
            <service id="base" class="App\Base" abstract="true"/>
            <service id="child" parent="base"/>
        </services>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    result.expect("loads");

    let base = container.registry().blueprint("base").expect("base");
    assert!(!base.is_public());
    assert!(base.has_tag("app.default"));

    let child = container
        .registry()
        .get("child")
        .and_then(|entry| entry.as_child())
        .expect("child blueprint");
    assert_eq!(child.parent(), "base");
    assert_eq!(child.blueprint().visibility(), None);
    assert!(child.blueprint().tags().is_empty());
    assert!(child.blueprint().autowired_methods().is_empty());
}

#[test]
fn test_loading_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<parameters><parameter key="mailer.host">localhost</parameter></parameters>
        <services>
            <service id="a" class="App\A">
                <argument type="service"><service class="App\B"/></argument>
                <call method="setLogger"><argument type="service" id="logger"/></call>
                <tag name="app.handler" priority="10"/>
            </service>
            <service class="App\Wild"/>
        </services>"#,
    );

    let (first, first_result) = load(&dir, "services.xml");
    let (second, second_result) = load(&dir, "services.xml");
    first_result.expect("first load");
    second_result.expect("second load");

    assert_eq!(first.registry(), second.registry());
    assert_eq!(first.parameters(), second.parameters());
}

#[test]
fn test_wild_service_is_deprecated_and_private() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(
        &dir,
        "services.xml",
        r#"<services>
            <defaults public="true"/>
            <service class="App\Wild"/>
        </services>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    let report = result.expect("loads");

    assert!(
        report
            .warnings()
            .iter()
            .any(|warning| warning.code() == Some(ErrorCode::E302))
    );
    let wild = container
        .registry()
        .blueprint(&anonymous_id(1, &path))
        .expect("wild service registered");
    assert!(!wild.is_public());
}

#[test]
fn test_tag_attribute_normalization() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services>
            <service id="listener" class="App\Listener">
                <tag name="kernel.event_listener" event-name="kernel.request" foo-bar="1" foo_bar="2"/>
            </service>
        </services>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    result.expect("loads");

    let blueprint = container.registry().blueprint("listener").expect("listener");
    let tag = &blueprint.tags()[0];
    assert_eq!(tag.name(), "kernel.event_listener");
    assert_eq!(tag.parameter("event-name"), Some(&Scalar::from("kernel.request")));
    assert_eq!(tag.parameter("event_name"), Some(&Scalar::from("kernel.request")));
    assert_eq!(tag.parameter("foo-bar"), Some(&Scalar::Int(1)));
    assert_eq!(tag.parameter("foo_bar"), Some(&Scalar::Int(2)));
    assert!(tag.parameter("name").is_none());
}

#[test]
fn test_parameters_are_case_insensitive() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<parameters>
            <parameter key="Mailer.Port">25</parameter>
            <parameter key="mailer.transports" type="collection">
                <parameter>smtp</parameter>
                <parameter>sendmail</parameter>
            </parameter>
        </parameters>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    result.expect("loads");

    let parameters = container.parameters();
    assert_eq!(
        parameters.get("mailer.port"),
        Some(&ArgumentValue::Scalar(Scalar::Int(25)))
    );
    let transports = parameters
        .get("mailer.transports")
        .and_then(ArgumentValue::as_arguments)
        .expect("collection");
    assert_eq!(transports.len(), 2);
}

#[test]
fn test_imports_are_relative_to_the_importing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write(
        &dir,
        "services.xml",
        r#"<imports><import resource="packages/mailer.xml"/></imports>
        <services><service id="app" class="App\App"/></services>"#,
    );
    let imported = write(
        &dir,
        "packages/mailer.xml",
        r#"<parameters><parameter key="mailer.host">localhost</parameter></parameters>
        <services><service id="mailer" class="App\Mailer"/></services>"#,
    );

    let (container, result) = load(&dir, "services.xml");
    result.expect("loads");

    assert!(container.registry().contains("app"));
    assert!(container.registry().contains("mailer"));
    assert!(container.parameters().has("mailer.host"));
    assert_eq!(container.resources(), [main, imported]);
}

#[test]
fn test_circular_import() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir, "a.xml", r#"<imports><import resource="b.xml"/></imports>"#);
    let importing = write(
        &dir,
        "b.xml",
        r#"<imports><import resource="a.xml" ignore-errors="true"/></imports>"#,
    );

    let (_, result) = load(&dir, "a.xml");
    let err = result.expect_err("cycle must fail");
    let primary = err.primary().expect("primary diagnostic");
    assert_eq!(primary.code(), Some(ErrorCode::E005));
    assert!(primary.message().contains("a.xml"));
    assert!(primary.message().contains(" > "));
    assert_eq!(primary.file(), Some(importing.as_path()));
}

#[test]
fn test_ignored_import_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<imports>
            <import resource="missing.xml" ignore-errors="true"/>
            <import resource="broken.xml" ignore-errors="true"/>
        </imports>
        <services><service id="a" class="App\A"/></services>"#,
    );
    fs::write(dir.path().join("broken.xml"), "<container").expect("write broken");

    let (container, result) = load(&dir, "services.xml");
    result.expect("ignored failures do not fail the load");
    assert!(container.registry().contains("a"));
}

#[test]
fn test_missing_import() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write(
        &dir,
        "services.xml",
        r#"<imports><import resource="missing.xml"/></imports>"#,
    );

    let (_, result) = load(&dir, "services.xml");
    let err = result.expect_err("missing import must fail");
    let primary = err.primary().expect("primary diagnostic");
    assert_eq!(primary.code(), Some(ErrorCode::E004));
    assert_eq!(primary.file(), Some(main.as_path()));
    assert_eq!(primary.labels().len(), 1);
    assert_eq!(primary.labels()[0].message(), "imported here");
}

#[test]
fn test_unsupported_import_points_at_importing_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write(
        &dir,
        "services.xml",
        r#"<imports><import resource="services.yaml"/></imports>"#,
    );

    let (_, result) = load(&dir, "services.xml");
    let err = result.expect_err("unsupported import must fail");
    let primary = err.primary().expect("primary diagnostic");
    assert_eq!(primary.code(), Some(ErrorCode::E006));
    assert_eq!(primary.file(), Some(main.as_path()));
    assert!(primary.labels()[0].is_primary());
}

#[test]
fn test_malformed_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("services.xml"), "<container><services>").expect("write");

    let (_, result) = load(&dir, "services.xml");
    assert_eq!(error_code(result), Some(ErrorCode::E001));
}

#[test]
fn test_structural_validation_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services><service id="a"><argument type="unknown">x</argument></service></services>"#,
    );

    let (_, result) = load(&dir, "services.xml");
    assert_eq!(error_code(result), Some(ErrorCode::E002));
}

#[test]
fn test_unknown_extension_namespace() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir, "services.xml", r#"<acme:config enabled="true"/>"#);

    let (_, result) = load(&dir, "services.xml");
    let err = result.expect_err("unclaimed namespace");
    let primary = err.primary().expect("primary diagnostic");
    assert_eq!(primary.code(), Some(ErrorCode::E200));
    assert!(primary.message().contains("http://acme.dev/schema/dic/acme"));
    assert!(primary.message().contains("found none"));
}

#[test]
fn test_extension_configuration_is_recorded() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<acme:config enabled="true">
            <acme:transport>smtp</acme:transport>
            <acme:transport>null</acme:transport>
        </acme:config>
        <acme:config/>"#,
    );

    let mut container = ContainerBuilder::new();
    container.register_extension(DeclaredExtension::new(
        "http://acme.dev/schema/dic/acme",
        "acme",
    ));
    load_into(&loader(&dir), &mut container, "services.xml").expect("loads");

    let configs = container.extension_config("acme");
    assert_eq!(configs.len(), 2);
    assert_eq!(
        configs[0].get("enabled"),
        Some(&ConfigValue::Scalar(Scalar::Bool(true)))
    );
    assert_eq!(
        configs[0].get("transport").and_then(ConfigValue::as_list).map(<[_]>::len),
        Some(2)
    );
    assert_eq!(configs[1], ConfigValue::empty_map());
}

#[test]
fn test_missing_extension_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = document(r#"<acme:config/>"#).replace(
        "xmlns:acme=\"http://acme.dev/schema/dic/acme\">",
        "xmlns:acme=\"http://acme.dev/schema/dic/acme\" xsi:schemaLocation=\"http://acme.dev/schema/dic/acme http://acme.dev/schema/dic/acme/acme-1.0.xsd\">",
    );
    fs::write(dir.path().join("services.xml"), source).expect("write");

    let mut container = ContainerBuilder::new();
    container.register_extension(
        DeclaredExtension::new("http://acme.dev/schema/dic/acme", "acme")
            .with_schema(SchemaSource::Directory(dir.path().join("schemas"))),
    );
    let result = load_into(&loader(&dir), &mut container, "services.xml");
    let err = result.expect_err("missing schema");
    let primary = err.primary().expect("primary diagnostic");
    assert_eq!(primary.code(), Some(ErrorCode::E003));
    assert!(primary.message().contains("acme-1.0.xsd"));

    // Disabling validation skips the schema lookup altogether.
    let loader = loader(&dir).with_options(LoaderOptions::new().with_schema_validation(false));
    let mut container = ContainerBuilder::new();
    container.register_extension(
        DeclaredExtension::new("http://acme.dev/schema/dic/acme", "acme")
            .with_schema(SchemaSource::Directory(dir.path().join("schemas"))),
    );
    load_into(&loader, &mut container, "services.xml").expect("loads without validation");
}

/// Records the schema files it was handed and whether they existed.
#[derive(Debug, Default)]
struct RecordingValidator {
    seen: Rc<RefCell<Vec<(PathBuf, bool)>>>,
}

impl SchemaValidator for RecordingValidator {
    fn validate(&self, document: &Document, schemas: &[SchemaLocation]) -> Result<(), Vec<String>> {
        let mut seen = self.seen.borrow_mut();
        for path in schemas.iter().filter_map(SchemaLocation::path) {
            seen.push((path.to_path_buf(), path.is_file()));
        }
        StructuralValidator.validate(document, schemas)
    }
}

#[test]
fn test_embedded_schema_is_removed_after_validation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = document(r#"<acme:config enabled="true"/>"#).replace(
        "xmlns:acme=\"http://acme.dev/schema/dic/acme\">",
        "xmlns:acme=\"http://acme.dev/schema/dic/acme\" xsi:schemaLocation=\"http://acme.dev/schema/dic/acme acme.xsd\">",
    );
    fs::write(dir.path().join("services.xml"), source).expect("write");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let loader = loader(&dir).with_validator(RecordingValidator { seen: Rc::clone(&seen) });
    let mut container = ContainerBuilder::new();
    container.register_extension(
        DeclaredExtension::new("http://acme.dev/schema/dic/acme", "acme").with_schema(
            SchemaSource::Embedded {
                name: "acme".to_string(),
                contents: "<xsd:schema xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\"/>".to_string(),
            },
        ),
    );
    load_into(&loader, &mut container, "services.xml").expect("loads");

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    let (path, existed) = &seen[0];
    assert!(*existed, "schema must exist during validation");
    assert!(!path.exists(), "schema must be removed afterwards");
}

#[test]
fn test_constants() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services>
            <service id="a" class="App\A">
                <argument type="constant"> APP_ENV </argument>
            </service>
        </services>"#,
    );

    let (_, result) = load(&dir, "services.xml");
    assert_eq!(error_code(result), Some(ErrorCode::E102));

    let loader = loader(&dir)
        .with_options(LoaderOptions::new().with_constant("APP_ENV", Scalar::from("prod")));
    let mut container = ContainerBuilder::new();
    load_into(&loader, &mut container, "services.xml").expect("loads");

    let a = container.registry().blueprint("a").expect("blueprint");
    assert_eq!(
        a.arguments().position(0),
        Some(&ArgumentValue::Constant {
            name: "APP_ENV".to_string(),
            value: Scalar::from("prod"),
        })
    );
}

#[test]
fn test_nesting_depth_limit() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir,
        "services.xml",
        r#"<services>
            <service id="a" class="App\A">
                <factory method="create">
                    <service class="App\Factory">
                        <factory method="create"><service class="App\FactoryFactory"/></factory>
                    </service>
                </factory>
            </service>
        </services>"#,
    );

    let shallow = loader(&dir).with_options(LoaderOptions::new().with_max_nesting_depth(1));
    let result = load_into(&shallow, &mut ContainerBuilder::new(), "services.xml");
    assert_eq!(error_code(result), Some(ErrorCode::E103));

    let (container, result) = load(&dir, "services.xml");
    result.expect("default depth is enough");
    let factory = container
        .registry()
        .blueprint("a")
        .and_then(|a| a.factory())
        .expect("factory");
    let Callable::Method {
        target: CallableTarget::Inline(inline),
        method,
    } = factory
    else {
        panic!("expected an inline factory, got {factory}");
    };
    assert_eq!(method, "create");
    assert_eq!(
        inline.as_blueprint().and_then(|blueprint| blueprint.class()),
        Some("App\\Factory")
    );
}

#[test]
fn test_unsupported_and_missing_resources() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loader = loader(&dir);

    assert!(loader.supports("services.xml", None));
    assert!(!loader.supports("services.yaml", None));

    let result = load_into(&loader, &mut ContainerBuilder::new(), "services.yaml");
    assert_eq!(error_code(result), Some(ErrorCode::E006));

    let result = load_into(&loader, &mut ContainerBuilder::new(), "absent.xml");
    assert_eq!(error_code(result), Some(ErrorCode::E004));
}
