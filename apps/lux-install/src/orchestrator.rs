//! Sequences the pipeline for every product and collects the results.
//!
//! Per product: resolve the latest release, select an asset, install it.
//! Products are handled one after the other and independently; a product
//! that cannot be installed never stops the next one. Once every product
//! has been attempted the install directory is registered on the search
//! path and every binary present at its destination is verified, including
//! binaries left by an earlier run for products that failed this time.

use std::path::PathBuf;

use crate::config::{Product, Settings};
use crate::errors::InstallerError;
use crate::installer::{
    InstallTarget, MatchStrategy, Platform, Registration, ReleaseClient,
    SearchPathStore, SelectionRule, Verification, install_artifact, register, verify_binary,
};

/// What happened to one product.
#[derive(Debug)]
pub enum ProductOutcome {
    /// The binary is in place.
    Installed {
        /// Release tag installed.
        release: String,
        /// Asset file name that was downloaded.
        asset: String,
        /// Naming convention the asset matched.
        strategy: MatchStrategy,
        /// Installed binary.
        path: PathBuf,
        /// Result of the version check.
        verification: Verification,
    },
    /// Nothing installable was published for this platform.
    BuildFromSource {
        /// Why no prebuilt binary was used.
        reason: InstallerError,
        /// Version check of a binary left by an earlier install, if any.
        previous: Option<Verification>,
    },
    /// A prebuilt binary exists but could not be installed.
    Failed {
        /// The transfer or extraction failure.
        error: InstallerError,
        /// Version check of a binary left by an earlier install, if any.
        previous: Option<Verification>,
    },
}

impl ProductOutcome {
    fn from_error(error: InstallerError) -> Self {
        if error.suggests_source_build() {
            Self::BuildFromSource {
                reason: error,
                previous: None,
            }
        } else {
            Self::Failed {
                error,
                previous: None,
            }
        }
    }

    /// Returns whether the product ended up installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

/// One product and its outcome.
#[derive(Debug)]
pub struct ProductReport {
    /// The product attempted.
    pub product: Product,
    /// What happened to it.
    pub outcome: ProductOutcome,
}

/// What happened to the search path.
#[derive(Debug)]
pub enum PathStatus {
    /// The registrar ran.
    Registered(Registration),
    /// Registration was disabled.
    Skipped,
    /// The store could not be opened, read or written.
    Failed(InstallerError),
}

/// Consolidated result of one installer run.
#[derive(Debug)]
pub struct InstallReport {
    /// Platform the assets were selected for.
    pub platform: Platform,
    /// Directory the binaries were installed into.
    pub install_dir: PathBuf,
    /// Per-product results, in installation order.
    pub products: Vec<ProductReport>,
    /// Search path registration result.
    pub path: PathStatus,
}

impl InstallReport {
    /// Returns whether every product was installed.
    #[must_use]
    pub fn all_installed(&self) -> bool {
        self.products.iter().all(|p| p.outcome.is_installed())
    }

    /// Returns whether the user must restart their shell.
    #[must_use]
    pub fn needs_restart(&self) -> bool {
        matches!(&self.path, PathStatus::Registered(r) if r.needs_restart())
    }
}

/// Drives one installer run.
pub struct Orchestrator<'a> {
    settings: &'a Settings,
    platform: Platform,
    client: &'a ReleaseClient,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator for `platform` with resolved settings.
    #[must_use]
    pub fn new(settings: &'a Settings, platform: Platform, client: &'a ReleaseClient) -> Self {
        Self {
            settings,
            platform,
            client,
        }
    }

    /// Installs every product, registers the install directory and verifies
    /// the result. `open_store` is only called when path modification is
    /// enabled.
    pub async fn run<F>(&self, products: &[Product], open_store: F) -> InstallReport
    where
        F: FnOnce() -> Result<Box<dyn SearchPathStore>, InstallerError>,
    {
        let mut reports = Vec::with_capacity(products.len());
        for product in products {
            log::info!("installing {}", product.name);
            let outcome = self.install_product(product).await;
            reports.push(ProductReport {
                product: *product,
                outcome,
            });
        }

        let path = if self.settings.modify_path {
            match open_store() {
                Ok(mut store) => self.register_path(store.as_mut()),
                Err(e) => PathStatus::Failed(e),
            }
        } else {
            PathStatus::Skipped
        };

        self.verify_products(&mut reports).await;

        InstallReport {
            platform: self.platform,
            install_dir: self.settings.install_dir.clone(),
            products: reports,
            path,
        }
    }

    /// Resolves, selects and installs one product.
    pub async fn install_product(&self, product: &Product) -> ProductOutcome {
        match self.try_install(product).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("{}: {e}", product.name);
                ProductOutcome::from_error(e)
            }
        }
    }

    async fn try_install(&self, product: &Product) -> Result<ProductOutcome, InstallerError> {
        let release = self
            .client
            .latest_release(product.repository)
            .await
            .ok_or_else(|| InstallerError::release_not_found(product.repository))?;

        let rule = SelectionRule::for_product(product, self.platform);
        let selection = rule.select(&release.assets).ok_or_else(|| {
            InstallerError::no_matching_asset(
                product.repository,
                &release.tag,
                self.platform.as_str(),
            )
        })?;
        log::info!(
            "{}: selected {} ({}, {})",
            product.name,
            selection.asset.name,
            selection.strategy,
            selection.kind
        );

        let target = InstallTarget::new(
            &selection.asset.url,
            selection.kind,
            &self.settings.install_dir,
            product.binary,
            self.platform.executable_extension(),
        );
        let installed = install_artifact(self.client.http(), &target).await?;
        log::debug!(
            "{}: {} bytes downloaded, {} files extracted",
            product.name,
            installed.bytes,
            installed.extracted.len()
        );

        Ok(ProductOutcome::Installed {
            release: release.tag.clone(),
            asset: selection.asset.name.clone(),
            strategy: selection.strategy,
            path: installed.path,
            verification: Verification::Skipped,
        })
    }

    /// Runs the version check for every product whose binary is at its
    /// destination. Products that were not installed this run only get a
    /// check when an earlier binary is still in place.
    async fn verify_products(&self, reports: &mut [ProductReport]) {
        let exe = self.platform.executable_extension();
        for report in reports {
            let destination = self
                .settings
                .install_dir
                .join(format!("{}{exe}", report.product.binary));
            match &mut report.outcome {
                ProductOutcome::Installed {
                    path, verification, ..
                } => {
                    if self.settings.verify {
                        *verification = verify_binary(path).await;
                    }
                }
                ProductOutcome::BuildFromSource { previous, .. }
                | ProductOutcome::Failed { previous, .. } => {
                    if destination.is_file() {
                        *previous = Some(if self.settings.verify {
                            verify_binary(&destination).await
                        } else {
                            Verification::Skipped
                        });
                    }
                }
            }
        }
    }

    /// Registers the install directory in `store`.
    pub fn register_path(&self, store: &mut dyn SearchPathStore) -> PathStatus {
        match register(store, &self.settings.install_dir) {
            Ok(registration) => PathStatus::Registered(registration),
            Err(e) => {
                log::warn!("{e}");
                PathStatus::Failed(e)
            }
        }
    }
}
