//! Static lesson package catalog

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Package {
    pub id: &'static str,
    pub name: &'static str,
    pub lessons: u32,
    /// Total price in whole dollars
    pub price: u32,
    /// Discount percentage against single lessons
    pub discount: u32,
}

pub const CATALOG: [Package; 4] = [
    Package { id: "p1", name: "Single Lesson", lessons: 1, price: 75, discount: 0 },
    Package { id: "p2", name: "Starter Pack", lessons: 5, price: 360, discount: 4 },
    Package { id: "p3", name: "Value Pack", lessons: 10, price: 700, discount: 7 },
    Package { id: "p4", name: "Pass Guarantee", lessons: 20, price: 1350, discount: 10 },
];

pub fn find(id: &str) -> Option<&'static Package> {
    CATALOG.iter().find(|p| p.id == id)
}

impl Package {
    pub fn per_lesson(&self) -> f64 {
        (self.price as f64 / self.lessons as f64 * 100.0).round() / 100.0
    }
}

/// Catalog entry as served by `GET /api/packages`
#[derive(Debug, Clone, Serialize)]
pub struct PackageListing {
    #[serde(flatten)]
    pub package: Package,
    pub per_lesson: f64,
}

pub fn listings() -> Vec<PackageListing> {
    CATALOG
        .iter()
        .map(|p| PackageListing { package: *p, per_lesson: p.per_lesson() })
        .collect()
}
