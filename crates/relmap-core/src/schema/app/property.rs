use super::{ComplexTypeId, Facet};
use crate::schema::db::StoreGenerated;
use crate::schema::graph::ScalarType;
use serde::Serialize;

/// A scalar or complex property of an entity or complex type.
#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub name: String,

    pub ty: PropertyTy,

    pub nullable: Facet<bool>,

    pub max_length: Option<Facet<u32>>,

    pub fixed_length: Option<Facet<bool>>,

    pub column_name: Option<Facet<String>>,

    pub column_order: Option<Facet<i32>>,

    pub column_type: Option<Facet<String>>,

    /// Precision and scale
    pub precision: Option<Facet<(u8, u8)>>,

    pub concurrency_token: bool,

    /// Row version column maintained by the store
    pub row_version: bool,

    pub store_generated: Option<Facet<StoreGenerated>>,

    /// Position among the declaring type's members
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyTy {
    Scalar(ScalarType),
    Complex(ComplexTypeId),
}

impl Property {
    pub(crate) fn new(name: &str, ty: PropertyTy, nullable: bool, index: usize) -> Self {
        Self {
            name: name.to_string(),
            ty,
            nullable: Facet::convention(nullable),
            max_length: None,
            fixed_length: None,
            column_name: None,
            column_order: None,
            column_type: None,
            precision: None,
            concurrency_token: false,
            row_version: false,
            store_generated: None,
            index,
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable.value
    }

    pub fn scalar_ty(&self) -> Option<ScalarType> {
        match self.ty {
            PropertyTy::Scalar(ty) => Some(ty),
            PropertyTy::Complex(_) => None,
        }
    }

    pub fn complex_ty(&self) -> Option<ComplexTypeId> {
        match self.ty {
            PropertyTy::Complex(id) => Some(id),
            PropertyTy::Scalar(_) => None,
        }
    }

    pub fn store_generated(&self) -> StoreGenerated {
        self.store_generated
            .as_ref()
            .map(|facet| facet.value)
            .unwrap_or(StoreGenerated::None)
    }
}
