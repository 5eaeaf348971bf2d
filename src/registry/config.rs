use crate::naming::NamingConvention;

/// Registry construction options.
///
/// # Examples
///
/// ```
/// use modelbase::registry::RegistryConfig;
///
/// let config = RegistryConfig::new()
///     .max_identifier_length(30)
///     .load_extensions(false);
/// assert_eq!(config.naming.max_identifier_length(), 30);
/// ```
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Constraint naming templates, fixed for the registry's lifetime.
    pub naming: NamingConvention,

    /// Load optional type extensions (email/url types).
    pub load_extensions: bool,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self {
            naming: NamingConvention::default(),
            load_extensions: true,
        }
    }

    /// Set the naming convention
    pub fn naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    /// Set the longest identifier generated names may use
    pub fn max_identifier_length(mut self, max: usize) -> Self {
        self.naming = self.naming.with_max_identifier_length(max);
        self
    }

    pub fn load_extensions(mut self, load: bool) -> Self {
        self.load_extensions = load;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}
