//! Contract configuration

/// Naming options for the generated contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfig {
    /// Contract name written into the exported mapping
    pub contract_name: String,

    /// Component instance name used to qualify every signal
    pub component_name: String,

    /// Smart object id the component is bound to
    pub smart_object_id: u32,

    /// Contract version string
    pub version: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            contract_name: "CrestronTouchpanel".into(),
            component_name: "Touchpanel".into(),
            smart_object_id: 1,
            version: "1.0.0.0".into(),
        }
    }
}

impl ContractConfig {
    /// Set the component instance name
    pub fn component_name(mut self, name: impl Into<String>) -> Self {
        self.component_name = name.into();
        self
    }

    /// Set the contract name
    pub fn contract_name(mut self, name: impl Into<String>) -> Self {
        self.contract_name = name.into();
        self
    }

    /// Set the smart object id
    pub fn smart_object_id(mut self, id: u32) -> Self {
        self.smart_object_id = id;
        self
    }

    /// Set the contract version string
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Qualify a signal name with the component name
    pub fn qualify(&self, short_name: &str) -> String {
        format!("{}.{}", self.component_name, short_name)
    }
}
