//! Cartesian expansion of oneof groups into named field combinations.

use std::collections::BTreeMap;

use grpc_openapi_core::descriptor::Field;

use crate::casing::lower_camel;

/// One selection of a single member per oneof group.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination<'a> {
    /// `<owner>_<member>_..._<member>`, members in sorted group order.
    pub name: String,
    /// Selected members, in sorted group order.
    pub fields: Vec<&'a Field>,
}

/// Every combination of one member per group.
///
/// Groups are visited in key order (a `BTreeMap` keeps them sorted); members
/// keep their declaration order within each group. Groups with fewer than two
/// members must be filtered out by the caller. No groups yields a single,
/// empty combination named after `owner`.
#[must_use]
pub fn combinations<'a>(
    owner: &str,
    groups: &BTreeMap<String, Vec<&'a Field>>,
) -> Vec<Combination<'a>> {
    let mut partial = vec![Combination {
        name: owner.to_string(),
        fields: Vec::new(),
    }];
    for members in groups.values() {
        partial = partial
            .iter()
            .flat_map(|combo| {
                members.iter().map(move |&member| {
                    let mut fields = combo.fields.clone();
                    fields.push(member);
                    Combination {
                        name: format!("{}_{}", combo.name, lower_camel(&member.name)),
                        fields,
                    }
                })
            })
            .collect();
    }
    partial
}
