//! Built-in convention units for JVM project trees.
//!
//! These mirror the conventions a Gradle multi-module build usually ships in
//! its `buildSrc`-style plugin build: a shared build-parameters plugin, a
//! toolchain convention gated on the java plugin, a java-library convention
//! and a publishing convention.

use crate::core::capability::well_known::{
    BUILD_PARAMETERS, JAVA, JAVA_LIBRARY, KOTLIN_JVM, MAVEN_PUBLISH, SIGNING,
};
use crate::core::convention::{ConventionSet, ConventionUnit};
use crate::core::parameter::{ParamType, Parameter, ParameterRegistry};
use crate::resolver::errors::ConfigureError;

pub const BUILD_PARAMETERS_UNIT: &str = "build-parameters";
pub const BASE_CONVENTIONS: &str = "base-conventions";
pub const JAVA_TOOLCHAIN_CONVENTIONS: &str = "java-toolchain-conventions";
pub const JAVA_LIBRARY_CONVENTIONS: &str = "java-library-conventions";
pub const PUBLISHING_CONVENTIONS: &str = "publishing-conventions";

/// Parameter selecting the Java toolchain version.
pub const JAVA_TOOLCHAIN_VERSION: &str = "javaToolchainVersion";

/// Toolchain version used when `javaToolchainVersion` is not supplied.
pub const DEFAULT_JAVA_VERSION: i64 = 17;

pub const PUBLISHING_GROUP_ID: &str = "publishingGroupId";
pub const PUBLISHING_VERSION: &str = "publishingVersion";
pub const DEFAULT_PUBLISHING_VERSION: &str = "0.0.1";

/// Declare the parameters the built-in conventions read.
///
/// The publication group defaults to the workspace name.
pub fn declare_parameters(
    params: &mut ParameterRegistry,
    workspace_name: &str,
) -> Result<(), ConfigureError> {
    params.declare(
        Parameter::new(JAVA_TOOLCHAIN_VERSION, ParamType::Integer)
            .with_description("Defines the Java toolchain version to use for compiling code"),
    )?;
    params.declare(
        Parameter::new(PUBLISHING_GROUP_ID, ParamType::String)
            .with_default(workspace_name)
            .with_description("Group id of published artifacts"),
    )?;
    params.declare(
        Parameter::new(PUBLISHING_VERSION, ParamType::String)
            .with_default(DEFAULT_PUBLISHING_VERSION)
            .with_description("Version of published artifacts"),
    )
}

/// Register all built-in convention units.
pub fn register(set: &mut ConventionSet) -> Result<(), ConfigureError> {
    set.register(build_parameters())?;
    set.register(java_toolchain_conventions())?;
    set.register(base_conventions())?;
    set.register(java_library_conventions())?;
    set.register(publishing_conventions())?;
    Ok(())
}

fn build_parameters() -> ConventionUnit {
    ConventionUnit::new(BUILD_PARAMETERS_UNIT)
        .with_description("Exposes the typed build parameters to the module")
        .apply(|ctx| ctx.provide(BUILD_PARAMETERS))
}

fn java_toolchain_conventions() -> ConventionUnit {
    ConventionUnit::new(JAVA_TOOLCHAIN_CONVENTIONS)
        .with_description("Selects the Java toolchain once the java plugin is applied")
        .requires(BUILD_PARAMETERS_UNIT)
        .when_present(JAVA, |ctx| {
            let version = ctx.param_or(JAVA_TOOLCHAIN_VERSION, DEFAULT_JAVA_VERSION);

            ctx.set("java.toolchain.languageVersion", version);
            ctx.set("javaExec.launcher", format!("java-{}", version));
            // Compile outputs are only shareable when built with the default toolchain
            ctx.set("javaCompile.cacheable", version == DEFAULT_JAVA_VERSION);

            ctx.when_present(KOTLIN_JVM, move |ctx| {
                ctx.set("kotlin.jvmToolchain.languageVersion", version);
                Ok(())
            })
        })
}

fn base_conventions() -> ConventionUnit {
    ConventionUnit::new(BASE_CONVENTIONS)
        .with_description("Settings shared by every module")
        .requires(JAVA_TOOLCHAIN_CONVENTIONS)
        .apply(|ctx| {
            let module = ctx.module();
            let name = module.name().to_string();
            let description = module.description().map(str::to_string);

            ctx.set("project.name", name);
            if let Some(description) = description {
                ctx.set("project.description", description);
            }
            Ok(())
        })
}

fn java_library_conventions() -> ConventionUnit {
    ConventionUnit::new(JAVA_LIBRARY_CONVENTIONS)
        .with_description("java-library plugin with shared compiler and test settings")
        .requires(BASE_CONVENTIONS)
        .apply(|ctx| {
            ctx.append("repositories", "mavenCentral");
            ctx.append("repositories", "localMavenRepo");
            ctx.provide(JAVA)?;
            ctx.provide(JAVA_LIBRARY)
        })
        .when_present(JAVA, |ctx| {
            ctx.append("javaCompile.args", "-Xlint:deprecation");
            ctx.set("test.useJUnitPlatform", true);
            ctx.set("test.maxHeapSize", "2G");
            Ok(())
        })
}

fn publishing_conventions() -> ConventionUnit {
    ConventionUnit::new(PUBLISHING_CONVENTIONS)
        .with_description("Maven publication and signing")
        .requires(BASE_CONVENTIONS)
        .requires(BUILD_PARAMETERS_UNIT)
        .apply(|ctx| {
            ctx.provide(MAVEN_PUBLISH)?;
            ctx.provide(SIGNING)
        })
        .when_present(JAVA, |ctx| {
            let name = ctx.module().name().to_string();
            let group: String = ctx.params().resolve_as(PUBLISHING_GROUP_ID)?;
            let version: String = ctx.params().resolve_as(PUBLISHING_VERSION)?;

            ctx.set("publishing.publication", "mavenJava");
            ctx.set("publishing.component", "java");
            ctx.set("publishing.groupId", group);
            ctx.set("publishing.artifactId", name);
            ctx.set("publishing.version", version);
            Ok(())
        })
        .when_present(SIGNING, |ctx| {
            ctx.append("signing.publications", "mavenJava");
            Ok(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::module::Module;
    use crate::core::parameter::ParamValue;
    use crate::resolver::compose::Composer;

    fn setup() -> (ConventionSet, ParameterRegistry) {
        let mut set = ConventionSet::new();
        register(&mut set).unwrap();
        let mut params = ParameterRegistry::new();
        declare_parameters(&mut params, "graphma").unwrap();
        (set, params)
    }

    #[test]
    fn test_java_library_uses_default_toolchain() {
        let (set, params) = setup();
        let module = Module::new("graphma-core", "graphma-core")
            .with_convention(JAVA_LIBRARY_CONVENTIONS);
        let config = Composer::new(&set, &params).compose(&module).unwrap();

        assert_eq!(
            config.applied,
            vec![
                BUILD_PARAMETERS_UNIT,
                JAVA_TOOLCHAIN_CONVENTIONS,
                BASE_CONVENTIONS,
                JAVA_LIBRARY_CONVENTIONS
            ]
        );
        assert_eq!(config.get_integer("java.toolchain.languageVersion"), Some(17));
        assert_eq!(config.get_bool("javaCompile.cacheable"), Some(true));
        assert_eq!(config.get_str("test.maxHeapSize"), Some("2G"));
        assert_eq!(config.get_str("project.name"), Some("graphma-core"));
        assert!(config.has_capability("java-library"));
        assert!(config.get("kotlin.jvmToolchain.languageVersion").is_none());
    }

    #[test]
    fn test_toolchain_override() {
        let (set, mut params) = setup();
        params.set_override(JAVA_TOOLCHAIN_VERSION, 21_i64).unwrap();

        let module = Module::new("core", "core").with_convention(JAVA_LIBRARY_CONVENTIONS);
        let config = Composer::new(&set, &params).compose(&module).unwrap();

        assert_eq!(config.get_integer("java.toolchain.languageVersion"), Some(21));
        assert_eq!(config.get_bool("javaCompile.cacheable"), Some(false));
        assert_eq!(config.get_str("javaExec.launcher"), Some("java-21"));
    }

    #[test]
    fn test_toolchain_without_java_does_nothing() {
        let (set, params) = setup();
        let module = Module::new("docs", "docs").with_convention(BASE_CONVENTIONS);
        let config = Composer::new(&set, &params).compose(&module).unwrap();

        assert!(config.get("java.toolchain.languageVersion").is_none());
        assert_eq!(config.capabilities, vec![BUILD_PARAMETERS]);
    }

    #[test]
    fn test_kotlin_toolchain_follows_java() {
        let (mut set, params) = setup();
        set.register(ConventionUnit::new("kotlin").apply(|ctx| ctx.provide(KOTLIN_JVM)))
            .unwrap();

        let module = Module::new("core", "core")
            .with_conventions([JAVA_LIBRARY_CONVENTIONS, "kotlin"]);
        let config = Composer::new(&set, &params).compose(&module).unwrap();

        assert_eq!(
            config.get_integer("kotlin.jvmToolchain.languageVersion"),
            Some(17)
        );
    }

    #[test]
    fn test_publishing_before_java_library() {
        let (set, params) = setup();
        let module = Module::new("graphma-core", "graphma-core")
            .with_conventions([PUBLISHING_CONVENTIONS, JAVA_LIBRARY_CONVENTIONS]);
        let config = Composer::new(&set, &params).compose(&module).unwrap();

        // publication is configured once java shows up from the later unit
        assert_eq!(config.get_str("publishing.artifactId"), Some("graphma-core"));
        assert_eq!(config.get_str("publishing.groupId"), Some("graphma"));
        assert_eq!(config.get_str("publishing.version"), Some("0.0.1"));
        assert_eq!(config.get_array("signing.publications").map(|a| a.len()), Some(1));
        assert!(config.has_capability(MAVEN_PUBLISH));
    }

    #[test]
    fn test_publishing_parameters_are_declared() {
        let (set, mut params) = setup();
        assert_eq!(
            params.resolve(PUBLISHING_GROUP_ID).unwrap(),
            ParamValue::from("graphma")
        );

        params.set_override_str(PUBLISHING_VERSION, "1.0.0").unwrap();
        params
            .set_override_str(PUBLISHING_GROUP_ID, "io.graphma")
            .unwrap();

        let module = Module::new("graphma-core", "graphma-core")
            .with_conventions([JAVA_LIBRARY_CONVENTIONS, PUBLISHING_CONVENTIONS]);
        let config = Composer::new(&set, &params).compose(&module).unwrap();

        assert_eq!(config.get_str("publishing.groupId"), Some("io.graphma"));
        assert_eq!(config.get_str("publishing.version"), Some("1.0.0"));
    }

    #[test]
    fn test_publishing_parameters_are_typed() {
        let (_, mut params) = setup();
        assert!(matches!(
            params.set_override(PUBLISHING_VERSION, 2_i64),
            Err(ConfigureError::ParameterTypeMismatch { .. })
        ));
    }
}
