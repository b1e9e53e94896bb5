//! Product catalog: identifiers resolved to selling and cost prices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BargainError, Result};

/// Position of a product in the catalog, shared with the co-occurrence matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub usize);

impl ProductId {
    /// Row/column index of this product.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product #{}", self.0)
    }
}

/// A sellable product with its listed and cost price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub selling_price: f64,
    pub cost_price: f64,
}

impl Product {
    pub fn new<S: Into<String>>(name: S, selling_price: f64, cost_price: f64) -> Self {
        Self {
            name: name.into(),
            selling_price,
            cost_price,
        }
    }

    /// Profit made when selling at the listed price.
    pub fn margin(&self) -> f64 {
        self.selling_price - self.cost_price
    }
}

/// Immutable, validated list of products. Ids are positions in this list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Product>", into = "Vec<Product>")]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Validates prices and builds the catalog.
    pub fn new(products: Vec<Product>) -> Result<Self> {
        for product in &products {
            let valid = product.selling_price.is_finite()
                && product.cost_price.is_finite()
                && product.cost_price > 0.0
                && product.selling_price >= product.cost_price;
            if !valid {
                return Err(BargainError::InvalidPrice {
                    product: product.name.clone(),
                    selling_price: product.selling_price,
                    cost_price: product.cost_price,
                });
            }
        }
        Ok(Self { products })
    }

    /// Start building a catalog one product at a time.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Iterates over every id in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = ProductId> {
        (0..self.products.len()).map(ProductId)
    }

    pub fn product(&self, id: ProductId) -> Result<&Product> {
        self.products
            .get(id.index())
            .ok_or_else(|| BargainError::unknown_product(id))
    }

    pub fn selling_price(&self, id: ProductId) -> Result<f64> {
        Ok(self.product(id)?.selling_price)
    }

    pub fn cost_price(&self, id: ProductId) -> Result<f64> {
        Ok(self.product(id)?.cost_price)
    }

    /// Fails on the first id that does not resolve.
    pub fn validate_bundle(&self, bundle: &[ProductId]) -> Result<()> {
        if bundle.is_empty() {
            return Err(BargainError::EmptyBundle);
        }
        for id in bundle {
            self.product(*id)?;
        }
        Ok(())
    }

    /// Sum of selling prices over `bundle`.
    pub fn listed_total(&self, bundle: &[ProductId]) -> Result<f64> {
        bundle.iter().map(|id| self.selling_price(*id)).sum()
    }

    /// Sum of cost prices over `bundle`.
    pub fn cost_total(&self, bundle: &[ProductId]) -> Result<f64> {
        bundle.iter().map(|id| self.cost_price(*id)).sum()
    }

    /// Finds the first product carrying `name`.
    pub fn find(&self, name: &str) -> Option<ProductId> {
        self.products
            .iter()
            .position(|product| product.name == name)
            .map(ProductId)
    }

    /// Resolves a comma-separated list of names, preserving their order.
    pub fn resolve_names(&self, names: &str) -> Result<Vec<ProductId>> {
        names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                self.find(name)
                    .ok_or_else(|| BargainError::UnknownProductName {
                        name: name.to_string(),
                    })
            })
            .collect()
    }
}

impl TryFrom<Vec<Product>> for Catalog {
    type Error = BargainError;

    fn try_from(products: Vec<Product>) -> Result<Self> {
        Self::new(products)
    }
}

impl From<Catalog> for Vec<Product> {
    fn from(catalog: Catalog) -> Self {
        catalog.products
    }
}

/// Builder that validates prices before constructing a [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    products: Vec<Product>,
}

impl CatalogBuilder {
    /// Appends a product; its id is its insertion position.
    pub fn product<S: Into<String>>(mut self, name: S, selling_price: f64, cost_price: f64) -> Self {
        self.products.push(Product::new(name, selling_price, cost_price));
        self
    }

    pub fn build(self) -> Result<Catalog> {
        Catalog::new(self.products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builder()
            .product("Smartphone", 10_000.0, 4_000.0)
            .product("Phone Case", 500.0, 100.0)
            .product("Screen Guard", 200.0, 50.0)
            .build()
            .unwrap()
    }

    #[test]
    fn totals_sum_over_the_bundle() {
        let catalog = catalog();
        let bundle = [ProductId(1), ProductId(2), ProductId(0)];
        assert_eq!(catalog.listed_total(&bundle).unwrap(), 10_700.0);
        assert_eq!(catalog.cost_total(&bundle).unwrap(), 4_150.0);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let catalog = catalog();
        let result = catalog.listed_total(&[ProductId(0), ProductId(7)]);
        assert!(matches!(
            result,
            Err(BargainError::UnknownProduct {
                product: ProductId(7)
            })
        ));
    }

    #[test]
    fn rejects_selling_below_cost() {
        let result = Catalog::builder().product("Mouse", 400.0, 500.0).build();
        assert!(matches!(result, Err(BargainError::InvalidPrice { .. })));
    }

    #[test]
    fn resolves_comma_separated_names() {
        let catalog = catalog();
        let ids = catalog.resolve_names("Phone Case, Smartphone").unwrap();
        assert_eq!(ids, vec![ProductId(1), ProductId(0)]);

        let missing = catalog.resolve_names("Phone Case,Laptop");
        assert!(matches!(
            missing,
            Err(BargainError::UnknownProductName { name }) if name == "Laptop"
        ));
    }
}
