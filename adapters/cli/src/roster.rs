//! Unit template rosters read from TOML manifests.

use std::{collections::HashSet, fs, path::Path};

use anyhow::{bail, Context, Result};
use skirmish_core::UnitTemplate;

const SUPPORTED_ROSTER_VERSION: u32 = 1;

/// Roster used when no manifest path is provided.
const BUNDLED_ROSTER: &str = include_str!("../assets/roster.toml");

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    units: Vec<UnitTemplate>,
}

/// Loads the roster at `path`, or the bundled roster when `path` is absent.
pub(crate) fn load(path: Option<&Path>) -> Result<Vec<UnitTemplate>> {
    let Some(path) = path else {
        return parse(BUNDLED_ROSTER).context("bundled roster is invalid");
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read roster at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid roster at {}", path.display()))
}

fn parse(contents: &str) -> Result<Vec<UnitTemplate>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse roster toml contents")?;
    if manifest.version != SUPPORTED_ROSTER_VERSION {
        bail!(
            "unsupported roster version {}; expected {}",
            manifest.version,
            SUPPORTED_ROSTER_VERSION
        );
    }
    if manifest.units.is_empty() {
        bail!("roster lists no unit templates");
    }

    let mut seen = HashSet::with_capacity(manifest.units.len());
    for template in &manifest.units {
        if !seen.insert(template.unit_type.as_str()) {
            bail!("roster contains duplicate unit type `{}`", template.unit_type);
        }
        if template.cost <= 0 {
            bail!(
                "unit type `{}` must cost at least one point",
                template.unit_type
            );
        }
    }

    Ok(manifest.units)
}
