//! Resource descriptions embedded in templates

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::errors::DeployError;

/// Metadata key under which a resource carries its human-readable description.
pub const DESCRIPTION_METADATA_KEY: &str = "deploy:description";

#[derive(Debug, Deserialize)]
struct Template {
    #[serde(rename = "Resources", default)]
    resources: BTreeMap<String, Resource>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(rename = "Metadata", default)]
    metadata: HashMap<String, serde_yaml::Value>,
}

/// Maps logical resource IDs to their description.
///
/// Accepts YAML (including short-form intrinsic tags such as `!Ref`) and JSON
/// bodies. Resources without a non-empty string description are left out.
pub fn parse_template_descriptions(body: &str) -> Result<HashMap<String, String>, DeployError> {
    let template: Template =
        serde_yaml::from_str(body).map_err(|e| DeployError::TemplateParse(e.to_string()))?;

    let descriptions = template
        .resources
        .into_iter()
        .filter_map(|(logical_id, resource)| {
            let description = resource.metadata.get(DESCRIPTION_METADATA_KEY)?.as_str()?.trim();
            if description.is_empty() {
                return None;
            }
            Some((logical_id, description.to_string()))
        })
        .collect();
    Ok(descriptions)
}
