//! Resource identity attached to every emitted signal

use keystone_core::BootstrapConfig;
use serde::Serialize;

/// Immutable identity shared by all pipelines and the health registry.
///
/// Built once per bootstrap and shared by `Arc`; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    service_name: String,
    service_version: String,
    attributes: Vec<(String, String)>,
}

impl ResourceDescriptor {
    /// Build the descriptor from configuration. Pure; missing values were
    /// already defaulted by the config layer.
    pub fn build(config: &BootstrapConfig) -> Self {
        let mut descriptor = Self {
            service_name: config.service_name.clone(),
            service_version: config.service_version.clone(),
            attributes: Vec::with_capacity(config.attributes.len()),
        };
        for (key, value) in &config.attributes {
            descriptor.set_attribute(key, value);
        }
        descriptor
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_version(&self) -> &str {
        &self.service_version
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    // Insertion-ordered; setting an existing key replaces its value in place.
    fn set_attribute(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_applies_defaults() {
        let descriptor = ResourceDescriptor::build(&BootstrapConfig::default());
        assert_eq!(descriptor.service_name(), "unknown-service");
        assert_eq!(descriptor.service_version(), "1.0.0");
        assert!(descriptor.attributes().is_empty());
    }

    #[test]
    fn duplicate_attribute_keys_replace_in_place() {
        let config = BootstrapConfig::default()
            .with_attribute("region", "eu-west-1")
            .with_attribute("zone", "a")
            .with_attribute("region", "us-east-2");

        let descriptor = ResourceDescriptor::build(&config);
        assert_eq!(
            descriptor.attributes(),
            &[
                ("region".to_string(), "us-east-2".to_string()),
                ("zone".to_string(), "a".to_string()),
            ]
        );
    }
}
