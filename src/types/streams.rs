use std::str::FromStr;

use serde::Serialize;

use crate::error::ModelError;

/// The four flattened attribute streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Vertices,
    Normals,
    Texcoords,
    Colors,
}

impl StreamKind {
    pub const ALL: [StreamKind; 4] = [
        StreamKind::Vertices,
        StreamKind::Normals,
        StreamKind::Texcoords,
        StreamKind::Colors,
    ];

    /// Floats per element.
    pub fn components(&self) -> usize {
        match self {
            StreamKind::Vertices | StreamKind::Normals => 3,
            StreamKind::Texcoords => 2,
            StreamKind::Colors => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Vertices => "vertices",
            StreamKind::Normals => "normals",
            StreamKind::Texcoords => "texcoords",
            StreamKind::Colors => "colors",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertices" => Ok(StreamKind::Vertices),
            "normals" => Ok(StreamKind::Normals),
            "texcoords" => Ok(StreamKind::Texcoords),
            "colors" => Ok(StreamKind::Colors),
            _ => Err(ModelError::UnknownStream(s.to_string())),
        }
    }
}

/// Flat per-corner attribute buffers, in face/vertex traversal order.
///
/// `vertices` always has one entry per visited face corner. The other streams
/// only receive entries from meshes that carry the attribute, so in a model
/// mixing meshes with and without e.g. normals they end up shorter than
/// `vertices` and no longer line up with it (see [`Self::is_aligned`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeStreams {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
}

impl AttributeStreams {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.texcoords.clear();
        self.colors.clear();
    }

    /// True when all four streams are empty.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.normals.is_empty()
            && self.texcoords.is_empty()
            && self.colors.is_empty()
    }

    /// Element count of one stream.
    pub fn len_of(&self, kind: StreamKind) -> usize {
        match kind {
            StreamKind::Vertices => self.vertices.len(),
            StreamKind::Normals => self.normals.len(),
            StreamKind::Texcoords => self.texcoords.len(),
            StreamKind::Colors => self.colors.len(),
        }
    }

    /// Every non-empty attribute stream has exactly one entry per vertex.
    pub fn is_aligned(&self) -> bool {
        let n = self.vertices.len();
        [StreamKind::Normals, StreamKind::Texcoords, StreamKind::Colors]
            .iter()
            .map(|&k| self.len_of(k))
            .all(|len| len == 0 || len == n)
    }

    /// Borrow one stream as flat floats.
    pub fn view(&self, kind: StreamKind) -> StreamView<'_> {
        let data: &[f32] = match kind {
            StreamKind::Vertices => bytemuck::cast_slice(&self.vertices),
            StreamKind::Normals => bytemuck::cast_slice(&self.normals),
            StreamKind::Texcoords => bytemuck::cast_slice(&self.texcoords),
            StreamKind::Colors => bytemuck::cast_slice(&self.colors),
        };
        StreamView { kind, data }
    }

    /// One descriptor per stream, in vertex/normal/texcoord/color order.
    pub fn buffer_descriptors(&self) -> Vec<BufferDescriptor<'_>> {
        StreamKind::ALL
            .iter()
            .map(|&kind| {
                let view = self.view(kind);
                BufferDescriptor {
                    role: kind,
                    data: view.data,
                }
            })
            .collect()
    }
}

/// Borrowed flat view of one stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamView<'a> {
    pub kind: StreamKind,
    pub data: &'a [f32],
}

impl<'a> StreamView<'a> {
    /// An empty view, used when a stream cannot be resolved.
    pub fn empty(kind: StreamKind) -> Self {
        Self { kind, data: &[] }
    }

    /// Number of elements (tuples), not floats.
    pub fn len(&self) -> usize {
        self.data.len() / self.kind.components()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate the stream as fixed-size tuples.
    pub fn elements(&self) -> std::slice::ChunksExact<'a, f32> {
        self.data.chunks_exact(self.kind.components())
    }
}

/// Binds one stream to its semantic role for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferDescriptor<'a> {
    pub role: StreamKind,
    pub data: &'a [f32],
}

impl<'a> BufferDescriptor<'a> {
    pub fn components(&self) -> usize {
        self.role.components()
    }

    pub fn element_count(&self) -> usize {
        self.data.len() / self.components()
    }

    /// Raw bytes for a GPU upload.
    pub fn as_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.data)
    }
}
