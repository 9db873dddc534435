//! Customization components for the lx image.
//!
//! Components are organized by phase:
//! - SYSTEM: UTC timezone, locale
//! - SERVICES: systemd drop-ins relaxing sandboxing that zones cannot honour
//! - ACCESS: sshd hardening
//! - BRANDING: MOTD and `/etc/product`

use super::{append_block, symlink, write_file, write_file_mode, Installable, Op, Phase};
use crate::config::BuildConfig;
use crate::profile::BuildProfile;

/// Marker line in front of the appended sshd block.
pub const SSHD_MARKER: &str = "# lx image: sshd hardening";

/// Drop-in relaxing the namespace and syscall sandboxing of a unit.
///
/// lx zones do not provide the mount and device namespaces these
/// directives need, so the units would fail to start.
pub const SANDBOX_OVERRIDE: &str = "\
[Service]
PrivateTmp=false
PrivateDevices=false
PrivateNetwork=false
ProtectSystem=false
ProtectHome=false
ProtectKernelTunables=false
ProtectControlGroups=false
MemoryDenyWriteExecute=false
SystemCallFilter=
";

pub const WEB_SERVICE_OVERRIDE: &str = "\
[Service]
PrivateTmp=false
PrivateDevices=false
";

/// World-readable; `/etc/motd` and `/etc/product` are read by unprivileged
/// logins and platform agents.
pub const BRANDING_FILE_MODE: u32 = 0o644;

/// Path of the drop-in for `service`.
pub fn override_path(service: &str) -> String {
    format!("etc/systemd/system/{service}.service.d/override.conf")
}

// =============================================================================
// Phase 1: System
// =============================================================================

pub struct Timezone {
    pub zone: String,
}

impl Installable for Timezone {
    fn name(&self) -> &str {
        "timezone"
    }

    fn phase(&self) -> Phase {
        Phase::System
    }

    fn ops(&self) -> Vec<Op> {
        vec![symlink(
            "etc/localtime",
            format!("../usr/share/zoneinfo/{}", self.zone),
        )]
    }
}

pub struct Locale {
    pub lang: String,
}

impl Installable for Locale {
    fn name(&self) -> &str {
        "locale"
    }

    fn phase(&self) -> Phase {
        Phase::System
    }

    fn ops(&self) -> Vec<Op> {
        vec![write_file(
            "etc/locale.conf",
            format!("LANG=\"{}\"\n", self.lang),
        )]
    }
}

// =============================================================================
// Phase 2: Services
// =============================================================================

pub struct SandboxOverrides {
    pub services: Vec<String>,
}

impl Installable for SandboxOverrides {
    fn name(&self) -> &str {
        "sandbox-overrides"
    }

    fn phase(&self) -> Phase {
        Phase::Services
    }

    fn ops(&self) -> Vec<Op> {
        self.services
            .iter()
            .map(|service| write_file(override_path(service), SANDBOX_OVERRIDE))
            .collect()
    }
}

pub struct WebServiceOverride {
    pub service: String,
}

impl Installable for WebServiceOverride {
    fn name(&self) -> &str {
        "web-service-override"
    }

    fn phase(&self) -> Phase {
        Phase::Services
    }

    fn ops(&self) -> Vec<Op> {
        vec![write_file(override_path(&self.service), WEB_SERVICE_OVERRIDE)]
    }
}

// =============================================================================
// Phase 3: Access
// =============================================================================

pub struct SshHardening {
    pub directives: Vec<String>,
}

impl Installable for SshHardening {
    fn name(&self) -> &str {
        "sshd-hardening"
    }

    fn phase(&self) -> Phase {
        Phase::Access
    }

    fn ops(&self) -> Vec<Op> {
        let mut content = String::new();
        for directive in &self.directives {
            content.push_str(directive);
            content.push('\n');
        }
        vec![append_block("etc/ssh/sshd_config", SSHD_MARKER, content)]
    }
}

// =============================================================================
// Phase 4: Branding
// =============================================================================

pub struct Motd {
    pub display_name: String,
    pub build_date: String,
    pub docs_url: String,
}

impl Installable for Motd {
    fn name(&self) -> &str {
        "motd"
    }

    fn phase(&self) -> Phase {
        Phase::Branding
    }

    fn ops(&self) -> Vec<Op> {
        vec![write_file_mode(
            "etc/motd",
            format!(
                "\n   {} ({})\n   {}\n\n",
                self.display_name, self.build_date, self.docs_url
            ),
            BRANDING_FILE_MODE,
        )]
    }
}

/// `/etc/product`, read by the platform to describe the instance.
pub struct Product {
    pub display_name: String,
    pub build_date: String,
    pub docs_url: String,
    pub description: String,
}

impl Installable for Product {
    fn name(&self) -> &str {
        "product"
    }

    fn phase(&self) -> Phase {
        Phase::Branding
    }

    fn ops(&self) -> Vec<Op> {
        vec![write_file_mode(
            "etc/product",
            format!(
                "Name: Instance\nImage: {} {}\nDocumentation: {}\nDescription: {}\n",
                self.display_name, self.build_date, self.docs_url, self.description
            ),
            BRANDING_FILE_MODE,
        )]
    }
}

/// Every customization for `config`, in declaration order.
pub fn customization_components(
    config: &BuildConfig,
    profile: &BuildProfile,
) -> Vec<Box<dyn Installable>> {
    let customize = &profile.customize;
    let mut components: Vec<Box<dyn Installable>> = vec![
        Box::new(Timezone {
            zone: customize.timezone.clone(),
        }),
        Box::new(Locale {
            lang: customize.locale.clone(),
        }),
        Box::new(SandboxOverrides {
            services: customize.sandboxed_services.clone(),
        }),
    ];

    if let Some(ref service) = customize.web_service {
        components.push(Box::new(WebServiceOverride {
            service: service.clone(),
        }));
    }

    components.push(Box::new(SshHardening {
        directives: customize.sshd_directives.clone(),
    }));
    components.push(Box::new(Motd {
        display_name: config.display_name.clone(),
        build_date: config.build_date.clone(),
        docs_url: config.docs_url.clone(),
    }));
    components.push(Box::new(Product {
        display_name: config.display_name.clone(),
        build_date: config.build_date.clone(),
        docs_url: config.docs_url.clone(),
        description: config.description.clone(),
    }));
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::DEFAULT_SANDBOXED_SERVICES;
    use std::path::PathBuf;

    fn config() -> BuildConfig {
        BuildConfig {
            install_dir: PathBuf::from("/data/root"),
            mirror: "https://mirror.test/f".into(),
            release: "39".into(),
            release_package: "fedora-release-39-36.noarch.rpm".into(),
            image_name: "fedora-39".into(),
            display_name: "Fedora 39 64-bit".into(),
            description: "Container-native Fedora 39".into(),
            docs_url: "https://docs.example.test/lx".into(),
            build_date: "20261019".into(),
        }
    }

    #[test]
    fn test_timezone_symlink_is_relative() {
        let ops = Timezone { zone: "UTC".into() }.ops();
        assert_eq!(
            ops,
            vec![Op::Symlink(
                "etc/localtime".into(),
                "../usr/share/zoneinfo/UTC".into()
            )]
        );
    }

    #[test]
    fn test_sandbox_override_per_service() {
        let ops = SandboxOverrides {
            services: vec!["systemd-logind".into(), "systemd-hostnamed".into()],
        }
        .ops();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            Op::WriteFile(
                "etc/systemd/system/systemd-logind.service.d/override.conf".into(),
                SANDBOX_OVERRIDE.into()
            )
        );
    }

    #[test]
    fn test_product_interpolates_verbatim() {
        let config = config();
        let product = Product {
            display_name: config.display_name.clone(),
            build_date: config.build_date.clone(),
            docs_url: config.docs_url.clone(),
            description: config.description.clone(),
        };
        match &product.ops()[0] {
            Op::WriteFileMode(path, content, mode) => {
                assert_eq!(path, "etc/product");
                assert_eq!(*mode, 0o644);
                assert!(content.contains("Image: Fedora 39 64-bit 20261019\n"));
                assert!(content.contains("Documentation: https://docs.example.test/lx\n"));
                assert!(content.contains("Description: Container-native Fedora 39\n"));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn test_default_component_set() {
        let components = customization_components(&config(), &BuildProfile::default());
        let names: Vec<&str> = components.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "timezone",
                "locale",
                "sandbox-overrides",
                "web-service-override",
                "sshd-hardening",
                "motd",
                "product",
            ]
        );

        let overrides = components
            .iter()
            .find(|c| c.name() == "sandbox-overrides")
            .map(|c| c.ops().len());
        assert_eq!(overrides, Some(DEFAULT_SANDBOXED_SERVICES.len()));
    }

    #[test]
    fn test_branding_files_are_world_readable() {
        use crate::executor::install_components;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        let components = customization_components(&config(), &BuildProfile::default());
        install_components(temp.path(), &components).unwrap();

        for file in ["etc/motd", "etc/product"] {
            let mode = fs::metadata(temp.path().join(file))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o644, "{file}");
        }
    }

    #[test]
    fn test_no_web_service() {
        let mut profile = BuildProfile::default();
        profile.customize.web_service = None;
        let components = customization_components(&config(), &profile);
        assert!(components.iter().all(|c| c.name() != "web-service-override"));
    }
}
