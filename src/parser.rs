use crate::error::DataError;
use crate::ir::{Hierarchy, HierarchyEdge, HierarchyEntry, PersonNode};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Record ids arrive as JSON strings or integers depending on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(value) => write!(f, "{value}"),
            RecordId::Text(value) => f.write_str(value),
        }
    }
}

/// Display fields nested under `data`, as node-editor style payloads send them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonData {
    pub name: Option<String>,
    #[serde(alias = "position")]
    pub title: Option<String>,
    #[serde(alias = "imageUrl")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub id: RecordId,
    #[serde(default, alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, alias = "last_name")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "parentId", alias = "managerId")]
    pub parent: Option<RecordId>,
    #[serde(default)]
    pub data: Option<PersonData>,
    #[serde(default)]
    pub children: Vec<ChildRef>,
}

/// A child entry is either a full nested record or a bare id reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChildRef {
    Record(Box<PersonRecord>),
    Id(RecordId),
}

impl ChildRef {
    fn id(&self) -> &RecordId {
        match self {
            ChildRef::Record(record) => &record.id,
            ChildRef::Id(id) => id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LinkRecord {
    Family {
        parent: RecordId,
        children: Vec<RecordId>,
    },
    Edge {
        source: RecordId,
        target: RecordId,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlatRecords {
    #[serde(alias = "people")]
    pub nodes: Vec<PersonRecord>,
    #[serde(default, alias = "relations", alias = "edges")]
    pub links: Vec<LinkRecord>,
}

/// Every inbound shape the data source is known to produce.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecordSet {
    Flat(FlatRecords),
    Nested(Box<PersonRecord>),
    Forest(Vec<PersonRecord>),
}

impl RecordSet {
    /// Decodes any supported shape. Nesting depth is bounded only by memory:
    /// serde_json's recursion limit is lifted and the stack grows on demand.
    pub fn from_json(input: &str) -> Result<Self, DataError> {
        let decode_error = |err: serde_json::Error| DataError::Decode {
            message: err.to_string(),
        };
        let mut json = serde_json::Deserializer::from_str(input);
        json.disable_recursion_limit();
        let records = Self::deserialize(serde_stacker::Deserializer::new(&mut json)).map_err(decode_error)?;
        json.end().map_err(decode_error)?;
        Ok(records)
    }
}

impl PersonRecord {
    fn display_name(&self) -> String {
        if let Some(name) = self
            .name
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|data| data.name.as_deref()))
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            return name.to_string();
        }
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            self.id.to_string()
        } else {
            joined
        }
    }

    fn to_person(&self) -> PersonNode {
        let data = self.data.as_ref();
        PersonNode {
            id: self.id.to_string(),
            name: self.display_name(),
            title: self
                .title
                .clone()
                .or_else(|| data.and_then(|d| d.title.clone())),
            avatar: self
                .avatar
                .clone()
                .or_else(|| data.and_then(|d| d.avatar.clone())),
            department: self.department.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

pub fn parse_records(input: &str) -> Result<Hierarchy, DataError> {
    build(&RecordSet::from_json(input)?)
}

pub fn build(records: &RecordSet) -> Result<Hierarchy, DataError> {
    let (people, edges) = normalize(records);
    build_from_parts(people, edges)
}

/// Flattens any record shape into people (declaration order) and edges.
pub fn normalize(records: &RecordSet) -> (Vec<PersonNode>, Vec<HierarchyEdge>) {
    let mut people = Vec::new();
    let mut edges = Vec::new();
    match records {
        RecordSet::Nested(root) => flatten_records(std::slice::from_ref(root.as_ref()), &mut people, &mut edges),
        RecordSet::Forest(roots) => flatten_records(roots, &mut people, &mut edges),
        RecordSet::Flat(flat) => {
            flatten_records(&flat.nodes, &mut people, &mut edges);
            for link in &flat.links {
                match link {
                    LinkRecord::Family { parent, children } => {
                        for child in children {
                            edges.push(HierarchyEdge::new(parent.to_string(), child.to_string()));
                        }
                    }
                    LinkRecord::Edge { source, target } => {
                        edges.push(HierarchyEdge::new(source.to_string(), target.to_string()));
                    }
                }
            }
        }
    }
    (people, edges)
}

fn flatten_records(
    roots: &[PersonRecord],
    people: &mut Vec<PersonNode>,
    edges: &mut Vec<HierarchyEdge>,
) {
    let mut stack: Vec<&PersonRecord> = roots.iter().rev().collect();
    while let Some(record) = stack.pop() {
        let id = record.id.to_string();
        if let Some(parent) = &record.parent {
            edges.push(HierarchyEdge::new(parent.to_string(), id.clone()));
        }
        people.push(record.to_person());
        let mut nested = Vec::new();
        for child in &record.children {
            edges.push(HierarchyEdge::new(id.clone(), child.id().to_string()));
            if let ChildRef::Record(child_record) = child {
                nested.push(child_record.as_ref());
            }
        }
        stack.extend(nested.into_iter().rev());
    }
}

/// Validates normalized people and edges and assembles the arena.
pub fn build_from_parts(
    people: Vec<PersonNode>,
    edges: Vec<HierarchyEdge>,
) -> Result<Hierarchy, DataError> {
    if people.is_empty() {
        return Err(DataError::Empty);
    }

    let mut order: Vec<String> = Vec::with_capacity(people.len());
    let mut entries: HashMap<String, HierarchyEntry> = HashMap::with_capacity(people.len());
    for person in people {
        if entries.contains_key(&person.id) {
            return Err(DataError::DuplicateId { id: person.id });
        }
        order.push(person.id.clone());
        entries.insert(
            person.id.clone(),
            HierarchyEntry {
                person,
                parent: None,
                children: Vec::new(),
            },
        );
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut unique_edges = Vec::with_capacity(edges.len());
    for edge in edges {
        if seen.insert((edge.parent.clone(), edge.child.clone())) {
            unique_edges.push(edge);
        }
    }

    let mut parents_of: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &unique_edges {
        for endpoint in [&edge.parent, &edge.child] {
            if !entries.contains_key(endpoint) {
                return Err(DataError::OrphanReference {
                    parent: edge.parent.clone(),
                    child: edge.child.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        if edge.parent == edge.child {
            return Err(DataError::CycleDetected {
                path: vec![edge.parent.clone(), edge.child.clone()],
            });
        }
        parents_of
            .entry(edge.child.as_str())
            .or_default()
            .push(edge.parent.as_str());
    }
    for id in &order {
        if let Some(parents) = parents_of.get(id.as_str())
            && parents.len() > 1
        {
            return Err(DataError::MultipleParents {
                child: id.clone(),
                parents: parents.iter().map(|p| p.to_string()).collect(),
            });
        }
    }

    for edge in &unique_edges {
        if let Some(entry) = entries.get_mut(&edge.child) {
            entry.parent = Some(edge.parent.clone());
        }
    }
    for edge in &unique_edges {
        if let Some(entry) = entries.get_mut(&edge.parent) {
            entry.children.push(edge.child.clone());
        }
    }

    if let Some(path) = find_cycle(&order, &entries) {
        return Err(DataError::CycleDetected { path });
    }

    let roots: Vec<String> = order
        .iter()
        .filter(|id| entries.get(id.as_str()).is_some_and(|entry| entry.parent.is_none()))
        .cloned()
        .collect();
    let root = match roots.len() {
        1 => roots[0].clone(),
        0 => return Err(DataError::CycleDetected { path: Vec::new() }),
        _ => return Err(DataError::MultipleRoots { roots }),
    };

    Ok(Hierarchy {
        root,
        entries,
        order,
    })
}

/// Walks parent pointers from every node; each node has at most one parent
/// here, so any revisit within a single walk is a cycle. The returned path is
/// in parent -> child order, starting at its earliest declared member and
/// repeating it at the end.
fn find_cycle(order: &[String], entries: &HashMap<String, HierarchyEntry>) -> Option<Vec<String>> {
    let rank: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();
    let mut done: HashSet<&str> = HashSet::new();
    for start in order {
        let mut walk: Vec<&str> = Vec::new();
        let mut on_walk: HashSet<&str> = HashSet::new();
        let mut current = Some(start.as_str());
        while let Some(id) = current {
            if done.contains(id) {
                break;
            }
            if on_walk.contains(id) {
                let from = walk.iter().position(|step| *step == id).unwrap_or(0);
                let mut cycle: Vec<&str> = walk[from..].to_vec();
                cycle.reverse();
                let pivot = cycle
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, member)| rank.get(*member).copied().unwrap_or(usize::MAX))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                cycle.rotate_left(pivot);
                let mut path: Vec<String> = cycle.iter().map(|s| s.to_string()).collect();
                if let Some(first) = path.first().cloned() {
                    path.push(first);
                }
                return Some(path);
            }
            walk.push(id);
            on_walk.insert(id);
            current = entries.get(id).and_then(|entry| entry.parent.as_deref());
        }
        done.extend(walk);
    }
    None
}
