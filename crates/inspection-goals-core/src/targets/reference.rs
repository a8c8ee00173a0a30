use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::normalize_label;

type BaseTable = BTreeMap<String, BTreeMap<String, i64>>;

/// Base monthly targets per brand and unit, expressed for a 21-workday month.
///
/// Immutable once built; inject it into a [`super::TargetResolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BaseTable", into = "BaseTable")]
pub struct TargetReference {
    brands: BTreeMap<String, BTreeMap<String, i64>>,
}

impl TargetReference {
    /// Build from an arbitrary table. Brand and unit keys are normalized
    /// (trimmed, whitespace-collapsed, upper-case).
    pub fn new(table: BaseTable) -> Self {
        let brands = table
            .into_iter()
            .map(|(brand, units)| {
                let units = units
                    .into_iter()
                    .map(|(unit, base)| (normalize_label(&unit), base))
                    .collect();
                (normalize_label(&brand), units)
            })
            .collect();
        TargetReference { brands }
    }

    /// The four Maranhão brands tracked by the production dashboard.
    pub fn builtin() -> Self {
        let table: [(&str, &[(&str, i64)]); 4] = [
            (
                "TOKYO",
                &[
                    ("BARRA DO CORDA", 677),
                    ("CHAPADINHA", 573),
                    ("SANTA INÊS", 2291),
                    ("SÃO JOÃO DOS PATOS", 453),
                    ("SÃO JOSÉ DE RIBAMAR", 2083),
                ],
            ),
            (
                "STARCHECK",
                &[
                    ("BACABAL", 1658),
                    ("BALSAS", 1642),
                    ("CAXIAS", 604),
                    ("CODÓ", 446),
                    ("PINHEIRO", 917),
                    ("SÃO LUÍS", 3272),
                ],
            ),
            (
                "LOG",
                &[
                    ("AÇAILÂNDIA", 1185),
                    ("CAROLINA", 126),
                    ("PRESIDENTE DUTRA", 926),
                    ("SÃO LUÍS", 4455),
                    ("TIMON", 896),
                ],
            ),
            (
                "VELOX",
                &[
                    ("ESTREITO", 482),
                    ("GRAJAÚ", 496),
                    ("IMPERATRIZ", 3488),
                    ("PEDREIRAS", 625),
                    ("SÃO LUÍS", 1926),
                ],
            ),
        ];

        let brands = table
            .iter()
            .map(|(brand, units)| {
                let units = units
                    .iter()
                    .map(|(u, base)| (u.to_string(), *base))
                    .collect();
                (brand.to_string(), units)
            })
            .collect();
        TargetReference { brands }
    }

    /// Base target for a unit; 0 when the brand or unit is unknown.
    pub fn base_target(&self, brand: &str, unit: &str) -> i64 {
        self.brands
            .get(brand)
            .and_then(|units| units.get(unit))
            .copied()
            .unwrap_or(0)
    }

    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.brands.keys().map(String::as_str)
    }

    /// Units of a brand in name order; empty for an unknown brand.
    pub fn units(&self, brand: &str) -> impl Iterator<Item = &str> {
        self.brands
            .get(brand)
            .into_iter()
            .flat_map(|units| units.keys().map(String::as_str))
    }

    pub fn contains_brand(&self, brand: &str) -> bool {
        self.brands.contains_key(brand)
    }
}

impl From<BaseTable> for TargetReference {
    fn from(table: BaseTable) -> Self {
        TargetReference::new(table)
    }
}

impl From<TargetReference> for BaseTable {
    fn from(reference: TargetReference) -> Self {
        reference.brands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let r = TargetReference::builtin();
        assert_eq!(r.base_target("TOKYO", "CHAPADINHA"), 573);
        assert_eq!(r.base_target("VELOX", "SÃO LUÍS"), 1926);
        assert_eq!(r.units("STARCHECK").count(), 6);
        assert_eq!(r.brands().count(), 4);
    }

    #[test]
    fn test_unknown_keys_resolve_to_zero() {
        let r = TargetReference::builtin();
        assert_eq!(r.base_target("ACME", "CHAPADINHA"), 0);
        assert_eq!(r.base_target("TOKYO", "NOWHERE"), 0);
        assert_eq!(r.units("ACME").count(), 0);
    }

    #[test]
    fn test_custom_table_keys_are_normalized() {
        let mut units = BTreeMap::new();
        units.insert("  são  luís ".to_string(), 100);
        let mut table = BTreeMap::new();
        table.insert("log".to_string(), units);
        let r = TargetReference::new(table);
        assert_eq!(r.base_target("LOG", "SÃO LUÍS"), 100);
    }
}
