//! Trust boundary nesting: parent resolution and cycle detection.

use crate::errors::{ThreatError, ThreatResult};
use crate::models::TrustBoundary;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

/// Map every nested boundary to its single parent, rejecting dangling
/// references, multiple parents and cycles of any length.
pub fn resolve_nesting(
    boundaries: &BTreeMap<String, TrustBoundary>,
) -> ThreatResult<HashMap<String, String>> {
    let mut parents: HashMap<String, String> = HashMap::new();
    for boundary in boundaries.values() {
        for child in &boundary.trust_boundaries_nested {
            if !boundaries.contains_key(child) {
                return Err(ThreatError::missing(
                    "trust boundary",
                    format!("nested trust boundaries of '{}'", boundary.id),
                    child,
                ));
            }
            match parents.get(child) {
                Some(first) if first == &boundary.id => continue,
                Some(first) => {
                    return Err(ThreatError::BoundaryNestedTwice {
                        boundary: child.clone(),
                        first: first.clone(),
                        second: boundary.id.clone(),
                    })
                }
                None => {
                    parents.insert(child.clone(), boundary.id.clone());
                }
            }
        }
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    for id in boundaries.keys() {
        let mut path = Vec::new();
        visit(id, boundaries, &mut marks, &mut path)?;
    }
    Ok(parents)
}

fn visit<'a>(
    id: &'a str,
    boundaries: &'a BTreeMap<String, TrustBoundary>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
) -> ThreatResult<()> {
    match marks.get(id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|p| *p == id).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|p| p.to_string()).collect();
            cycle.push(id.to_string());
            return Err(ThreatError::NestingCycle {
                boundary: id.to_string(),
                path: cycle,
            });
        }
        None => {}
    }

    marks.insert(id, Mark::Visiting);
    path.push(id);
    if let Some(boundary) = boundaries.get(id) {
        for child in &boundary.trust_boundaries_nested {
            visit(child, boundaries, marks, path)?;
        }
    }
    path.pop();
    marks.insert(id, Mark::Done);
    Ok(())
}
