//! Read-only product data shared by every negotiation session.

use crate::catalog::Catalog;
use crate::cooccurrence::CoOccurrenceMatrix;
use crate::error::{BargainError, Result};
use crate::recommender::Recommender;

/// A catalog paired with the co-occurrence matrix indexed by the same ids.
#[derive(Clone, Debug)]
pub struct Market {
    catalog: Catalog,
    matrix: CoOccurrenceMatrix,
}

impl Market {
    /// Checks that the matrix covers exactly the catalog's products.
    pub fn new(catalog: Catalog, matrix: CoOccurrenceMatrix) -> Result<Self> {
        if matrix.dimension() != catalog.len() {
            return Err(BargainError::dimension_mismatch(
                "co-occurrence dimension",
                catalog.len(),
                matrix.dimension(),
            ));
        }
        Ok(Self { catalog, matrix })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matrix(&self) -> &CoOccurrenceMatrix {
        &self.matrix
    }

    pub fn recommender(&self) -> Recommender<'_> {
        Recommender::new(&self.matrix)
    }
}
