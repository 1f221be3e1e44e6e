//! Human-readable rendering of an [`InstallReport`].

use std::fmt::Write as _;
use std::path::Path;

use crate::installer::{Platform, Registration, Verification};
use crate::orchestrator::{InstallReport, PathStatus, ProductOutcome, ProductReport};

/// Renders the full report as printed at the end of a run.
#[must_use]
pub fn render(report: &InstallReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Installed into {} ({})",
        report.install_dir.display(),
        report.platform
    );
    out.push('\n');

    for product in &report.products {
        render_product(&mut out, report, product);
    }

    out.push('\n');
    render_path(&mut out, report);

    if report.all_installed() {
        out.push_str("\nLux is ready.");
        if report.needs_restart() {
            out.push_str(" Open a new terminal to start using `lux` and `lpm`.");
        }
        out.push('\n');
    }
    out
}

fn render_product(out: &mut String, install: &InstallReport, report: &ProductReport) {
    let name = report.product.name;
    match &report.outcome {
        ProductOutcome::Installed {
            release,
            asset,
            strategy,
            path,
            verification,
            ..
        } => {
            let _ = writeln!(out, "{name} {release} installed from {asset} ({strategy})");
            let _ = writeln!(out, "  -> {}", path.display());
            match verification {
                Verification::Verified { output } => {
                    let _ = writeln!(out, "  {output}");
                }
                Verification::Unverified { reason } => {
                    let _ = writeln!(out, "  Warning: could not verify the install: {reason}");
                }
                Verification::Skipped => {}
            }
        }
        ProductOutcome::BuildFromSource { reason, previous } => {
            let _ = writeln!(out, "{name}: no prebuilt binary available ({reason})");
            let _ = writeln!(out, "  Build it from source: {}", report.product.source_url());
            render_previous(out, install, report, previous.as_ref());
        }
        ProductOutcome::Failed { error, previous } => {
            let _ = writeln!(out, "{name}: installation failed: {error}");
            let _ = writeln!(
                out,
                "  Re-run the installer, or build it from source: {}",
                report.product.source_url()
            );
            render_previous(out, install, report, previous.as_ref());
        }
    }
}

fn render_previous(
    out: &mut String,
    install: &InstallReport,
    report: &ProductReport,
    previous: Option<&Verification>,
) {
    let Some(previous) = previous else {
        return;
    };
    let path = install.install_dir.join(format!(
        "{}{}",
        report.product.binary,
        install.platform.executable_extension()
    ));
    match previous {
        Verification::Verified { output } => {
            let _ = writeln!(out, "  Previous install kept at {}: {output}", path.display());
        }
        Verification::Unverified { reason } => {
            let _ = writeln!(
                out,
                "  Warning: previous install at {} could not be verified: {reason}",
                path.display()
            );
        }
        Verification::Skipped => {
            let _ = writeln!(out, "  Previous install kept at {}", path.display());
        }
    }
}

fn render_path(out: &mut String, report: &InstallReport) {
    let dir = &report.install_dir;
    match &report.path {
        PathStatus::Registered(Registration::Added { location }) => {
            let _ = writeln!(out, "Added {} to PATH in {location}", dir.display());
            let _ = writeln!(out, "Restart your shell to pick up the change.");
        }
        PathStatus::Registered(Registration::AlreadyConfigured { location }) => {
            let _ = writeln!(out, "PATH already configured in {location}");
        }
        PathStatus::Skipped => {
            let _ = writeln!(out, "PATH was not modified. To use lux, add to your PATH:");
            let _ = writeln!(out, "  {}", manual_path_instruction(dir, report.platform));
        }
        PathStatus::Failed(e) => {
            let _ = writeln!(out, "Warning: could not configure PATH automatically: {e}");
            let _ = writeln!(out, "To use lux, add to your PATH:");
            let _ = writeln!(out, "  {}", manual_path_instruction(dir, report.platform));
        }
    }
}

/// Returns the instruction a user follows to add `dir` by hand.
#[must_use]
pub fn manual_path_instruction(dir: &Path, platform: Platform) -> String {
    if platform.is_windows() {
        format!("setx PATH \"%PATH%;{}\"", dir.display())
    } else {
        format!("export PATH=\"{}:$PATH\"", dir.display())
    }
}
