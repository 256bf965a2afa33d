//! Fixed property schemas per node kind
//!
//! Every node starts with the common transform header (location, scale,
//! rotation, opacity, visibility) followed by the properties specific to its
//! kind. Ids are stable across kinds, so `ids::W` means width on a group, a
//! rectangle and a text box alike.

use crate::node::NodeKind;
use crate::property::{PropertyId, PropertySpec};

/// Stable property identifiers
pub mod ids {
    use crate::property::PropertyId;

    pub const SCALE_X: PropertyId = PropertyId(2);
    pub const SCALE_Y: PropertyId = PropertyId(3);
    pub const ROTATE_Z: PropertyId = PropertyId(4);
    pub const R: PropertyId = PropertyId(5);
    pub const G: PropertyId = PropertyId(6);
    pub const B: PropertyId = PropertyId(7);
    pub const TEXTURE_ID: PropertyId = PropertyId(8);
    pub const TEXT: PropertyId = PropertyId(9);
    pub const W: PropertyId = PropertyId(10);
    pub const H: PropertyId = PropertyId(11);
    pub const FONT_SIZE: PropertyId = PropertyId(12);
    pub const VISIBLE: PropertyId = PropertyId(18);
    pub const ROTATE_X: PropertyId = PropertyId(19);
    pub const ROTATE_Y: PropertyId = PropertyId(20);
    pub const X: PropertyId = PropertyId(21);
    pub const Y: PropertyId = PropertyId(22);
    pub const GEOMETRY: PropertyId = PropertyId(24);
    pub const FILLED: PropertyId = PropertyId(25);
    pub const OPACITY: PropertyId = PropertyId(27);
    pub const FONT_ID: PropertyId = PropertyId(28);
    pub const TEXTURE_LEFT: PropertyId = PropertyId(30);
    pub const TEXTURE_RIGHT: PropertyId = PropertyId(31);
    pub const TEXTURE_TOP: PropertyId = PropertyId(32);
    pub const TEXTURE_BOTTOM: PropertyId = PropertyId(33);
    pub const CLIP_RECT: PropertyId = PropertyId(34);
    pub const DIMENSION: PropertyId = PropertyId(36);
    pub const TEXT_VALIGN: PropertyId = PropertyId(40);
    pub const TEXT_WRAP: PropertyId = PropertyId(41);
    pub const ORIGIN_X: PropertyId = PropertyId(42);
    pub const ORIGIN_Y: PropertyId = PropertyId(43);
    pub const FILL_R: PropertyId = PropertyId(44);
    pub const FILL_G: PropertyId = PropertyId(45);
    pub const FILL_B: PropertyId = PropertyId(46);
}

/// Texture id value meaning "no texture bound"
pub const NO_TEXTURE: u32 = 0;

/// Font id value meaning "no font selected"
pub const NO_FONT: u32 = 0;

/// Vertical text alignment, stored in `ids::TEXT_VALIGN`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextVAlign {
    #[default]
    Baseline = 0,
    Top = 1,
    Middle = 2,
    Bottom = 3,
}

impl TextVAlign {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Baseline),
            1 => Some(Self::Top),
            2 => Some(Self::Middle),
            3 => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Text wrapping mode, stored in `ids::TEXT_WRAP`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextWrap {
    #[default]
    None = 0,
    End = 1,
    Word = 2,
}

impl TextWrap {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::End),
            2 => Some(Self::Word),
            _ => None,
        }
    }
}

macro_rules! prop {
    ($id:expr, $name:literal, $default:expr) => {
        PropertySpec {
            id: $id,
            name: $name,
            default: $default,
            refresh: false,
        }
    };
    ($id:expr, $name:literal, $default:expr, refresh) => {
        PropertySpec {
            id: $id,
            name: $name,
            default: $default,
            refresh: true,
        }
    };
}

use crate::property::PropertyValue::{Bool, Float, FloatArray, Text, UInt};

static COMMON: [PropertySpec; 9] = [
    prop!(ids::X, "x", Float(0.0)),
    prop!(ids::Y, "y", Float(0.0)),
    prop!(ids::SCALE_X, "sx", Float(1.0)),
    prop!(ids::SCALE_Y, "sy", Float(1.0)),
    prop!(ids::ROTATE_X, "rx", Float(0.0)),
    prop!(ids::ROTATE_Y, "ry", Float(0.0)),
    prop!(ids::ROTATE_Z, "rz", Float(0.0)),
    prop!(ids::OPACITY, "opacity", Float(1.0)),
    prop!(ids::VISIBLE, "visible", Bool(true)),
];

static GROUP: [PropertySpec; 5] = [
    prop!(ids::W, "w", Float(0.0)),
    prop!(ids::H, "h", Float(0.0)),
    prop!(ids::ORIGIN_X, "originX", Float(0.0)),
    prop!(ids::ORIGIN_Y, "originY", Float(0.0)),
    prop!(ids::CLIP_RECT, "cliprect", Bool(false)),
];

static RECT: [PropertySpec; 12] = [
    prop!(ids::W, "w", Float(0.0)),
    prop!(ids::H, "h", Float(0.0)),
    prop!(ids::ORIGIN_X, "originX", Float(0.0)),
    prop!(ids::ORIGIN_Y, "originY", Float(0.0)),
    prop!(ids::R, "r", Float(1.0)),
    prop!(ids::G, "g", Float(1.0)),
    prop!(ids::B, "b", Float(1.0)),
    prop!(ids::TEXTURE_ID, "texid", UInt(NO_TEXTURE)),
    prop!(ids::TEXTURE_LEFT, "left", Float(0.0)),
    prop!(ids::TEXTURE_RIGHT, "right", Float(1.0)),
    prop!(ids::TEXTURE_TOP, "top", Float(0.0)),
    prop!(ids::TEXTURE_BOTTOM, "bottom", Float(1.0)),
];

static TEXT: [PropertySpec; 10] = [
    prop!(ids::R, "r", Float(1.0)),
    prop!(ids::G, "g", Float(1.0)),
    prop!(ids::B, "b", Float(1.0)),
    prop!(ids::W, "w", Float(0.0), refresh),
    prop!(ids::H, "h", Float(0.0)),
    prop!(ids::TEXT, "text", Text(String::new()), refresh),
    prop!(ids::FONT_SIZE, "fontSize", Float(20.0), refresh),
    prop!(ids::FONT_ID, "fontId", UInt(NO_FONT), refresh),
    prop!(ids::TEXT_VALIGN, "vAlign", UInt(TextVAlign::Baseline as u32)),
    prop!(ids::TEXT_WRAP, "wrap", UInt(TextWrap::None as u32), refresh),
];

static POLYGON: [PropertySpec; 6] = [
    prop!(ids::FILL_R, "fillR", Float(1.0)),
    prop!(ids::FILL_G, "fillG", Float(1.0)),
    prop!(ids::FILL_B, "fillB", Float(1.0)),
    prop!(ids::DIMENSION, "dimension", UInt(2)),
    prop!(ids::FILLED, "filled", Bool(true)),
    prop!(ids::GEOMETRY, "geometry", FloatArray(Vec::new())),
];

/// The ordered property schema of one node kind
#[derive(Clone, Copy, Debug)]
pub struct Schema {
    common: &'static [PropertySpec],
    specific: &'static [PropertySpec],
}

impl Schema {
    pub fn for_kind(kind: NodeKind) -> Self {
        let specific: &'static [PropertySpec] = match kind {
            NodeKind::Group => &GROUP,
            NodeKind::Rect => &RECT,
            NodeKind::Text => &TEXT,
            NodeKind::Polygon => &POLYGON,
        };
        Self {
            common: &COMMON,
            specific,
        }
    }

    pub fn len(&self) -> usize {
        self.common.len() + self.specific.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&'static PropertySpec> {
        if index < self.common.len() {
            self.common.get(index)
        } else {
            self.specific.get(index - self.common.len())
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static PropertySpec> {
        self.common.iter().chain(self.specific.iter())
    }

    /// Schema position of a property id
    pub fn position(&self, id: PropertyId) -> Option<usize> {
        self.iter().position(|spec| spec.id == id)
    }

    /// Schema position of a property name
    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.iter().position(|spec| spec.name == name)
    }
}
