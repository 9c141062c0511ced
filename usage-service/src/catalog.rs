use crate::config::CatalogConfig;

/// Immutable area/commodity catalog shared by the whole engine.
///
/// Area order is significant: dashboards, rankings and export columns all
/// follow catalog order, and ties in rankings are broken by it.
#[derive(Debug, Clone)]
pub struct Catalog {
    areas: Vec<String>,
    commodities: Vec<String>,
}

impl Catalog {
    pub fn new(cfg: &CatalogConfig) -> Self {
        Self {
            areas: cfg.areas.clone(),
            commodities: cfg.commodities.clone(),
        }
    }

    pub fn contains_area(&self, area: &str) -> bool {
        self.areas.iter().any(|a| a == area)
    }

    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    pub fn commodities(&self) -> &[String] {
        &self.commodities
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(&CatalogConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_contains_known_areas() {
        let catalog = Catalog::default();
        assert!(catalog.contains_area("HOSTEL 1"));
        assert!(catalog.contains_area("ACADEMIC BLOCK"));
        assert!(!catalog.contains_area("HOSTEL 6"));
        assert!(!catalog.contains_area("hostel 1"));
    }

    #[test]
    fn catalog_preserves_configured_order() {
        let cfg = CatalogConfig {
            areas: vec!["B".to_string(), "A".to_string()],
            commodities: vec!["domestic".to_string()],
        };
        let catalog = Catalog::new(&cfg);
        assert_eq!(catalog.areas(), &["B".to_string(), "A".to_string()]);
    }
}
