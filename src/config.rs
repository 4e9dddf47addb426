use crate::updater::UpdateQuality;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// First raw parameter id reserved for extensions. Ids at or above it are stored as-is.
pub const PARAM_EXTENSIONS_START: u32 = 0x10000;

const DEFAULT_MAX_BUFFERS: usize = 16;
const DEFAULT_BUFFER_FAILURE_LIMIT: u32 = 3;

/// Parameters that can be set on a backing store with `set_param()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    /// Non-zero allows reusing rendered pixels by shifting them inside their buffer.
    AllowInPlaceScroll,
    /// Non-zero requests buffers with power-of-two sizes so they can be sampled with
    /// normalized texture coordinates.
    AllowTextureCoordinate,
    /// Render operations allowed per update call when partial rendering is enabled.
    Priority,
    /// Quality hint for rendering, see [`UpdateQuality::from_raw`].
    Quality,
    /// Non-zero allows an update to stop before all requested content is rendered.
    AllowPartialRender,
    /// Extension parameter with an id `>= PARAM_EXTENSIONS_START`.
    Extension(u32),
}

impl Param {
    /// Maps a raw parameter id. Returns `None` for unknown ids below the extension range.
    pub fn from_raw(id: u32) -> Option<Param> {
        match id {
            0 => Some(Param::AllowInPlaceScroll),
            1 => Some(Param::AllowTextureCoordinate),
            2 => Some(Param::Priority),
            3 => Some(Param::Quality),
            4 => Some(Param::AllowPartialRender),
            id if id >= PARAM_EXTENSIONS_START => Some(Param::Extension(id)),
            _ => None,
        }
    }

    pub fn raw(&self) -> u32 {
        match self {
            Param::AllowInPlaceScroll => 0,
            Param::AllowTextureCoordinate => 1,
            Param::Priority => 2,
            Param::Quality => 3,
            Param::AllowPartialRender => 4,
            Param::Extension(id) => *id,
        }
    }
}

/// Configuration of a backing store.
///
/// The first five fields are the ones reachable through [`Param`]; the rest shape the tiling
/// policy and can only be set when constructing the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackingStoreConfig {
    pub allow_in_place_scroll: bool,
    pub allow_texture_coordinate: bool,
    pub priority: i32,
    pub quality: UpdateQuality,
    pub allow_partial_render: bool,
    /// Tile width in pixels, `0` means "viewport width".
    pub tile_width: u32,
    /// Tile height in pixels, `0` means "viewport height".
    pub tile_height: u32,
    /// Maximum number of buffers held at the same time.
    pub max_buffers: usize,
    /// Consecutive buffer creation failures after which the store reports an error.
    pub buffer_failure_limit: u32,
    /// Values of extension parameters, keyed by raw id.
    pub extensions: BTreeMap<u32, i32>,
}

impl Default for BackingStoreConfig {
    fn default() -> Self {
        Self {
            allow_in_place_scroll: true,
            allow_texture_coordinate: false,
            priority: 0,
            quality: UpdateQuality::High,
            allow_partial_render: false,
            tile_width: 0,
            tile_height: 0,
            max_buffers: DEFAULT_MAX_BUFFERS,
            buffer_failure_limit: DEFAULT_BUFFER_FAILURE_LIMIT,
            extensions: BTreeMap::new(),
        }
    }
}

impl BackingStoreConfig {
    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn with_max_buffers(mut self, max_buffers: usize) -> Self {
        self.max_buffers = max_buffers;
        self
    }

    pub fn with_buffer_failure_limit(mut self, limit: u32) -> Self {
        self.buffer_failure_limit = limit;
        self
    }

    pub fn with_in_place_scroll(mut self, allow: bool) -> Self {
        self.allow_in_place_scroll = allow;
        self
    }

    pub fn with_partial_render(mut self, allow: bool, priority: i32) -> Self {
        self.allow_partial_render = allow;
        self.priority = priority;
        self
    }

    pub fn with_quality(mut self, quality: UpdateQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Applies a parameter. Returns false when the parameter was rejected.
    pub fn set_param(&mut self, param: Param, value: i32) -> bool {
        match param {
            Param::AllowInPlaceScroll => self.allow_in_place_scroll = value != 0,
            Param::AllowTextureCoordinate => self.allow_texture_coordinate = value != 0,
            Param::Priority => self.priority = value,
            Param::Quality => self.quality = UpdateQuality::from_raw(value),
            Param::AllowPartialRender => self.allow_partial_render = value != 0,
            Param::Extension(id) if id >= PARAM_EXTENSIONS_START => {
                self.extensions.insert(id, value);
            }
            Param::Extension(id) => {
                log::warn!("Ignoring parameter {id:#x}: below the extension range");
                return false;
            }
        }
        true
    }

    /// Current value of a parameter, `None` for extensions that were never set.
    pub fn param(&self, param: Param) -> Option<i32> {
        match param {
            Param::AllowInPlaceScroll => Some(self.allow_in_place_scroll as i32),
            Param::AllowTextureCoordinate => Some(self.allow_texture_coordinate as i32),
            Param::Priority => Some(self.priority),
            Param::Quality => Some(self.quality.raw()),
            Param::AllowPartialRender => Some(self.allow_partial_render as i32),
            Param::Extension(id) => self.extensions.get(&id).copied(),
        }
    }

    /// Number of render operations a single update may perform, `None` when unbounded.
    pub(crate) fn render_budget(&self) -> Option<usize> {
        if self.allow_partial_render {
            Some(self.priority.max(1) as usize)
        } else {
            None
        }
    }
}
