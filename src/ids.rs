//! Object identity and the on-disk reference formats (§6).

use crate::error::{WorldError, WorldResult};
use std::fmt;

/// A process-unique integer identifying an object instance. Minted by an
/// external factory; the core never constructs one itself except for
/// negative sentinels used by tests and deserialization of objects that
/// haven't been assigned a "real" oid yet.
pub type Oid = i64;

/// Dungeon identifiers are non-empty strings free of `{`, `}`, `:`.
pub fn validate_dungeon_id(id: &str) -> WorldResult<()> {
    if id.is_empty() || id.contains(['{', '}', ':']) {
        return Err(WorldError::EmptyName(format!(
            "invalid dungeon id {id:?}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coordinate {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Coordinate { x, y, z }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{},{}}}", self.x, self.y, self.z)
    }
}

/// A stable on-disk room reference: `@<dungeonId>{x,y,z}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRef {
    pub dungeon_id: String,
    pub coordinates: Coordinate,
}

impl fmt::Display for RoomRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}{}", self.dungeon_id, self.coordinates)
    }
}

impl RoomRef {
    pub fn new(dungeon_id: impl Into<String>, coordinates: Coordinate) -> Self {
        RoomRef {
            dungeon_id: dungeon_id.into(),
            coordinates,
        }
    }

    /// Parses `@<dungeonId>{x,y,z}`. Round-trips with `Display`.
    pub fn parse(s: &str) -> WorldResult<RoomRef> {
        let rest = s
            .strip_prefix('@')
            .ok_or_else(|| WorldError::UnknownRoom(format!("missing '@': {s}")))?;
        let open = rest
            .find('{')
            .ok_or_else(|| WorldError::UnknownRoom(format!("missing '{{': {s}")))?;
        let close = rest
            .find('}')
            .ok_or_else(|| WorldError::UnknownRoom(format!("missing '}}': {s}")))?;
        if close < open {
            return Err(WorldError::UnknownRoom(format!("malformed braces: {s}")));
        }
        let dungeon_id = &rest[..open];
        let coords_str = &rest[open + 1..close];
        let parts: Vec<&str> = coords_str.split(',').collect();
        if parts.len() != 3 {
            return Err(WorldError::UnknownRoom(format!(
                "expected 3 coordinates: {s}"
            )));
        }
        let parse_i32 = |p: &str| {
            p.trim()
                .parse::<i32>()
                .map_err(|_| WorldError::UnknownRoom(format!("bad coordinate in {s}")))
        };
        let x = parse_i32(parts[0])?;
        let y = parse_i32(parts[1])?;
        let z = parse_i32(parts[2])?;
        Ok(RoomRef {
            dungeon_id: dungeon_id.to_string(),
            coordinates: Coordinate::new(x, y, z),
        })
    }
}

/// A template id, either local (`sword-basic`) or globalized
/// (`@<dungeonId>:<templateId>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Local(String),
    Global { dungeon_id: String, template_id: String },
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateRef::Local(id) => write!(f, "{id}"),
            TemplateRef::Global {
                dungeon_id,
                template_id,
            } => write!(f, "@{dungeon_id}:{template_id}"),
        }
    }
}

impl TemplateRef {
    pub fn parse(s: &str) -> TemplateRef {
        if let Some(rest) = s.strip_prefix('@') {
            if let Some((dungeon_id, template_id)) = rest.split_once(':') {
                return TemplateRef::Global {
                    dungeon_id: dungeon_id.to_string(),
                    template_id: template_id.to_string(),
                };
            }
        }
        TemplateRef::Local(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_ref_round_trips() {
        let r = RoomRef::new("midgar", Coordinate::new(3, 2, 0));
        let s = r.to_string();
        assert_eq!(s, "@midgar{3,2,0}");
        assert_eq!(RoomRef::parse(&s).unwrap(), r);
    }

    #[test]
    fn room_ref_rejects_missing_braces() {
        assert!(RoomRef::parse("@midgar3,2,0").is_err());
    }

    #[test]
    fn template_ref_parses_local_and_global() {
        assert_eq!(
            TemplateRef::parse("sword-basic"),
            TemplateRef::Local("sword-basic".to_string())
        );
        assert_eq!(
            TemplateRef::parse("@midgar:sword-basic"),
            TemplateRef::Global {
                dungeon_id: "midgar".to_string(),
                template_id: "sword-basic".to_string()
            }
        );
    }

    #[test]
    fn dungeon_id_validation() {
        assert!(validate_dungeon_id("midgar").is_ok());
        assert!(validate_dungeon_id("").is_err());
        assert!(validate_dungeon_id("mid{gar").is_err());
        assert!(validate_dungeon_id("mid:gar").is_err());
    }
}
