//! Configuration access port trait.

pub trait ConfigPort {
    /// Raw value; typed reads parse it (see `config_validation::parse_value`).
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// All section names, sorted.
    fn sections(&self) -> Vec<String>;

    /// Key/value pairs of one section, sorted by key. Keys without a value are omitted.
    fn section_entries(&self, section: &str) -> Vec<(String, String)>;
}
