use crate::error::MeshError;
use crate::types::{DataProduct, DataProductVersion, ProductLineage, ProductQuality};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Registry of data products and their version history
#[derive(Debug, Default)]
pub struct DataCatalog {
    products: BTreeMap<String, DataProduct>,
    versions: HashMap<String, Vec<DataProductVersion>>,
}

impl DataCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product, replacing any product with the same name and
    /// starting a fresh version history
    pub fn register_product(&mut self, product: DataProduct) {
        let name = product.name.clone();
        self.products.insert(name.clone(), product);
        self.versions.insert(name.clone(), Vec::new());
        info!("Registered data product: {}", name);
    }

    pub fn update_product(&mut self, mut product: DataProduct) -> Result<(), MeshError> {
        if !self.products.contains_key(&product.name) {
            return Err(MeshError::ProductNotFound(product.name));
        }

        product.updated_at = Utc::now();
        let name = product.name.clone();
        self.products.insert(name.clone(), product);
        info!("Updated data product: {}", name);
        Ok(())
    }

    pub fn get_product(&self, name: &str) -> Option<&DataProduct> {
        self.products.get(name)
    }

    /// List products sorted by name, optionally restricted to one domain
    pub fn list_products(&self, domain: Option<&str>) -> Vec<&DataProduct> {
        self.products
            .values()
            .filter(|product| domain.map_or(true, |d| product.domain == d))
            .collect()
    }

    pub fn add_version(&mut self, version: DataProductVersion) -> Result<(), MeshError> {
        let history = self
            .versions
            .get_mut(&version.product_name)
            .ok_or_else(|| MeshError::ProductNotFound(version.product_name.clone()))?;

        info!(
            "Added version {} for product {}",
            version.version, version.product_name
        );
        history.push(version);
        Ok(())
    }

    pub fn get_versions(&self, product_name: &str) -> &[DataProductVersion] {
        self.versions
            .get(product_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Case-insensitive substring search over name, description and tags
    pub fn search_products(&self, query: &str) -> Vec<&DataProduct> {
        let query = query.to_lowercase();
        self.products
            .values()
            .filter(|product| {
                product.name.to_lowercase().contains(&query)
                    || product.description.to_lowercase().contains(&query)
                    || product
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Version list of a product. Dependencies and dependents are not
    /// tracked at the catalog level and are always empty.
    pub fn product_lineage(&self, product_name: &str) -> Result<ProductLineage, MeshError> {
        if !self.products.contains_key(product_name) {
            return Err(MeshError::ProductNotFound(product_name.to_string()));
        }

        Ok(ProductLineage {
            product: product_name.to_string(),
            versions: self
                .get_versions(product_name)
                .iter()
                .map(|v| v.version.clone())
                .collect(),
            dependencies: Vec::new(),
            dependents: Vec::new(),
        })
    }

    pub fn product_quality(&self, product_name: &str) -> Result<ProductQuality, MeshError> {
        let product = self
            .products
            .get(product_name)
            .ok_or_else(|| MeshError::ProductNotFound(product_name.to_string()))?;

        Ok(ProductQuality {
            product: product_name.to_string(),
            quality_rules: product.quality_rules.clone(),
            policies: product.policies.clone(),
            last_updated: product.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;
    use serde_json::json;

    fn sample_product() -> DataProduct {
        serde_json::from_value(json!({
            "name": "test_product",
            "description": "Test data product",
            "domain": "test_domain",
            "owner": "test_owner",
            "version": "1.0.0",
            "schema": {"id": "integer", "name": "string", "value": "float"},
            "quality_rules": ["completeness", "accuracy"],
            "policies": ["data_retention"],
            "tags": ["test", "sample"]
        }))
        .unwrap()
    }

    fn sample_version() -> DataProductVersion {
        DataProductVersion {
            product_name: "test_product".to_string(),
            version: "1.0.1".to_string(),
            schema: Metadata::new(),
            created_by: "test_user".to_string(),
            change_description: "Added timestamp field".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_register_product() {
        let mut catalog = DataCatalog::new();
        let product = sample_product();
        catalog.register_product(product.clone());

        assert_eq!(catalog.get_product("test_product"), Some(&product));
        assert_eq!(catalog.get_product("test_product").unwrap().status, "active");
        assert!(catalog.get_versions("test_product").is_empty());
    }

    #[test]
    fn test_update_product() {
        let mut catalog = DataCatalog::new();
        catalog.register_product(sample_product());

        let mut updated = sample_product();
        updated.description = "Updated description".to_string();
        catalog.update_product(updated).unwrap();

        assert_eq!(
            catalog.get_product("test_product").unwrap().description,
            "Updated description"
        );
    }

    #[test]
    fn test_update_nonexistent_product() {
        let mut catalog = DataCatalog::new();
        let err = catalog.update_product(sample_product()).unwrap_err();
        assert_eq!(err.to_string(), "Product test_product not found");
    }

    #[test]
    fn test_list_products_by_domain() {
        let mut catalog = DataCatalog::new();
        catalog.register_product(sample_product());

        assert_eq!(catalog.list_products(None).len(), 1);
        assert_eq!(catalog.list_products(Some("test_domain")).len(), 1);
        assert!(catalog.list_products(Some("other_domain")).is_empty());
    }

    #[test]
    fn test_versions() {
        let mut catalog = DataCatalog::new();
        assert!(catalog.add_version(sample_version()).is_err());

        catalog.register_product(sample_product());
        catalog.add_version(sample_version()).unwrap();

        let versions = catalog.get_versions("test_product");
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, "1.0.1");

        // Re-registering starts a fresh history
        catalog.register_product(sample_product());
        assert!(catalog.get_versions("test_product").is_empty());
    }

    #[test]
    fn test_search_products() {
        let mut catalog = DataCatalog::new();
        catalog.register_product(sample_product());

        assert_eq!(catalog.search_products("TEST_PRODUCT").len(), 1);
        assert_eq!(catalog.search_products("data product").len(), 1);
        assert_eq!(catalog.search_products("sample").len(), 1);
        assert!(catalog.search_products("nothing").is_empty());
    }

    #[test]
    fn test_product_lineage_and_quality() {
        let mut catalog = DataCatalog::new();
        catalog.register_product(sample_product());
        catalog.add_version(sample_version()).unwrap();

        let lineage = catalog.product_lineage("test_product").unwrap();
        assert_eq!(lineage.versions, vec!["1.0.1".to_string()]);
        assert!(lineage.dependencies.is_empty());
        assert!(lineage.dependents.is_empty());

        let quality = catalog.product_quality("test_product").unwrap();
        assert_eq!(quality.quality_rules, vec!["completeness", "accuracy"]);
        assert_eq!(quality.policies, vec!["data_retention"]);

        assert!(matches!(
            catalog.product_lineage("missing"),
            Err(MeshError::ProductNotFound(_))
        ));
    }
}
