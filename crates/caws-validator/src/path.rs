//! Dotted field paths as used in findings, e.g. `scope.out[1]`

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Split a field path into segments. `None` for malformed paths.
pub fn parse_path(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();

    for part in path.split('.') {
        let (name, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if name.is_empty() {
            return None;
        }
        segments.push(Segment::Key(name.to_string()));

        while !rest.is_empty() {
            let close = rest.find(']')?;
            let index = rest.get(1..close)?.parse().ok()?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return None;
            }
        }
    }

    Some(segments)
}

pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    parse_path(path)?
        .iter()
        .try_fold(root, |node, segment| match segment {
            Segment::Key(key) => node.get(key.as_str()),
            Segment::Index(i) => node.get(*i),
        })
}

/// Write `value` at `path`, creating missing intermediate mappings.
/// Array indices must exist, or equal the length to append.
pub fn set_path(root: &mut Value, path: &str, value: Value) -> bool {
    let Some(segments) = parse_path(path) else {
        return false;
    };
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut node = root;
    for segment in parents {
        let Some(next) = child_mut(node, segment) else {
            return false;
        };
        node = next;
    }

    match last {
        Segment::Key(key) => match object_mut(node) {
            Some(map) => {
                map.insert(key.clone(), value);
                true
            }
            None => false,
        },
        Segment::Index(i) => match node {
            Value::Array(items) if *i < items.len() => {
                items[*i] = value;
                true
            }
            Value::Array(items) if *i == items.len() => {
                items.push(value);
                true
            }
            _ => false,
        },
    }
}

fn object_mut(node: &mut Value) -> Option<&mut Map<String, Value>> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()
}

fn child_mut<'a>(node: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match segment {
        Segment::Key(key) => Some(
            object_mut(node)?
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new())),
        ),
        Segment::Index(i) => node.as_array_mut()?.get_mut(*i),
    }
}
