//! Reading and writing HD morphs in the binary `.dhdm` format.
//!
//! All values are little-endian.
//!
//! ```text
//! header       u32 cookie (0xd0d0d0d0)
//!              i32 level count
//!              u32 0x3f800000
//!              i32 level count, again
//! level        i32 control face count
//!              i32 level
//!              i32 vertex edit count
//!              i32 size of the face edits in bytes
//! face edit    i32 control face
//!              i32 vertex edit count
//! vertex edit  f32 x, path, f32 y, f32 z
//! ```
//!
//! Below level 4 paths are at most four elements long and only fit the high
//! 16 bits of the [`PackedPath`], which is all that is stored. From level 4 on
//! the low half is stored first, then the high half.
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;
use ultraviolet::Vec3;

use super::{FaceEdit, HdMorph, Level, PackedPath, VertexEdit};
use crate::{Error, Result};

const COOKIE: u32 = 0xd0d0_d0d0;
const UNKNOWN: u32 = 0x3f80_0000;

/// First level whose paths need all 32 bits.
const LONG_PATH_LEVEL_THRESHOLD: usize = 4;

const FACE_EDIT_HEADER_SIZE: usize = 2 * 4;
const SHORT_VERTEX_EDIT_SIZE: usize = 2 + 3 * 4;
const LONG_VERTEX_EDIT_SIZE: usize = 2 * 2 + 3 * 4;

// Counts come from untrusted input.
const MAX_PREALLOCATION: usize = 1 << 16;

fn has_long_paths(level: usize) -> bool {
    LONG_PATH_LEVEL_THRESHOLD <= level
}

fn vertex_edit_size(level: usize) -> usize {
    if has_long_paths(level) {
        LONG_VERTEX_EDIT_SIZE
    } else {
        SHORT_VERTEX_EDIT_SIZE
    }
}

fn read_count(reader: &mut impl Read, what: &str) -> Result<usize> {
    let value = reader.read_i32::<LittleEndian>()?;
    usize::try_from(value)
        .map_err(|_| Error::InvalidFormat(format!("negative {}: {}", what, value)))
}

fn write_count(writer: &mut impl Write, value: usize, what: &str) -> Result<()> {
    let value = i32::try_from(value)
        .map_err(|_| Error::InvalidFormat(format!("{} too large: {}", what, value)))?;
    writer.write_i32::<LittleEndian>(value)?;
    Ok(())
}

fn read_vertex_edit(reader: &mut impl Read, level: usize) -> Result<VertexEdit> {
    let x = reader.read_f32::<LittleEndian>()?;

    let low = if has_long_paths(level) {
        reader.read_u16::<LittleEndian>()?
    } else {
        0
    };
    let high = reader.read_u16::<LittleEndian>()?;
    let packed_path = PackedPath::from_bits((high as u32) << 16 | low as u32);

    let y = reader.read_f32::<LittleEndian>()?;
    let z = reader.read_f32::<LittleEndian>()?;

    if packed_path.len() != level + 1 {
        return Err(Error::InvalidFormat(format!(
            "path {:#010x} at level {} has length {}, expected {}",
            packed_path.bits(),
            level,
            packed_path.len(),
            level + 1
        )));
    }

    Ok(VertexEdit::from_packed(packed_path, Vec3::new(x, y, z)))
}

fn read_level(reader: &mut impl Read) -> Result<Level> {
    let control_face_count = read_count(reader, "control face count")?;
    let level = read_count(reader, "level")?;
    if PackedPath::MAX_LEN < level + 1 {
        return Err(Error::InvalidFormat(format!(
            "level {} needs paths longer than {}",
            level,
            PackedPath::MAX_LEN
        )));
    }
    let vertex_edit_count = read_count(reader, "vertex edit count")?;
    let size_in_bytes = read_count(reader, "level size")?;

    let mut face_edits = Vec::new();
    let mut running_count = 0;
    let mut read_size = 0;
    while running_count < vertex_edit_count {
        let control_face = reader.read_i32::<LittleEndian>()?;
        let control_face = u32::try_from(control_face).map_err(|_| {
            Error::InvalidFormat(format!("negative control face: {}", control_face))
        })?;
        let count = read_count(reader, "face vertex edit count")?;

        let mut vertex_edits = Vec::with_capacity(count.min(MAX_PREALLOCATION));
        for _ in 0..count {
            vertex_edits.push(read_vertex_edit(reader, level)?);
        }

        running_count += count;
        read_size += FACE_EDIT_HEADER_SIZE + count * vertex_edit_size(level);
        face_edits.push(FaceEdit::new(control_face, vertex_edits));
    }

    if running_count != vertex_edit_count {
        return Err(Error::InvalidFormat(format!(
            "level {} announces {} vertex edits but has {}",
            level, vertex_edit_count, running_count
        )));
    }
    if read_size != size_in_bytes {
        return Err(Error::InvalidFormat(format!(
            "level {} announces {} bytes but has {}",
            level, size_in_bytes, read_size
        )));
    }

    Ok(Level::new(level, control_face_count, face_edits))
}

/// Reads an HD morph from `reader`.
///
/// Stops after the last level, whatever follows.
pub fn read(mut reader: impl Read) -> Result<HdMorph> {
    let cookie = reader.read_u32::<LittleEndian>()?;
    if COOKIE != cookie {
        return Err(Error::InvalidFormat(format!(
            "wrong cookie {:#010x}",
            cookie
        )));
    }

    let level_count = read_count(&mut reader, "level count")?;

    let unknown = reader.read_u32::<LittleEndian>()?;
    if UNKNOWN != unknown {
        return Err(Error::InvalidFormat(format!(
            "unexpected header value {:#010x}",
            unknown
        )));
    }

    let level_count_again = read_count(&mut reader, "level count")?;
    if level_count != level_count_again {
        return Err(Error::InvalidFormat(format!(
            "level count {} does not match repeated level count {}",
            level_count, level_count_again
        )));
    }

    let levels = (0..level_count)
        .map(|_| read_level(&mut reader))
        .collect::<Result<Vec<_>>>()?;

    let morph = HdMorph::new(levels)?;
    debug!(
        levels = morph.max_level(),
        vertex_edits = morph.vertex_edit_count(),
        "read HD morph"
    );
    Ok(morph)
}

fn check_path_lengths(morph: &HdMorph) -> Result<()> {
    for level in morph.levels() {
        for face_edit in level.face_edits() {
            if let Some(vertex_edit) = face_edit
                .vertex_edits()
                .iter()
                .find(|vertex_edit| vertex_edit.path_len() != level.level() + 1)
            {
                return Err(Error::InvalidFormat(format!(
                    "path {} on control face {} does not fit level {}",
                    vertex_edit.packed_path(),
                    face_edit.control_face(),
                    level.level()
                )));
            }
        }
    }
    Ok(())
}

/// Writes `morph` to `writer`.
///
/// Fails with [`Error::InvalidFormat`] if a path length is not its level
/// plus one, as such a file could not be read back. Nothing is written in
/// that case.
pub fn write(morph: &HdMorph, mut writer: impl Write) -> Result<()> {
    check_path_lengths(morph)?;

    writer.write_u32::<LittleEndian>(COOKIE)?;
    write_count(&mut writer, morph.levels().len(), "level count")?;
    writer.write_u32::<LittleEndian>(UNKNOWN)?;
    write_count(&mut writer, morph.levels().len(), "level count")?;

    for level in morph.levels() {
        let index = level.level();
        let size_in_bytes = level.face_edits().len() * FACE_EDIT_HEADER_SIZE
            + level.vertex_edit_count() * vertex_edit_size(index);

        write_count(&mut writer, level.control_face_count(), "control face count")?;
        write_count(&mut writer, index, "level")?;
        write_count(&mut writer, level.vertex_edit_count(), "vertex edit count")?;
        write_count(&mut writer, size_in_bytes, "level size")?;

        for face_edit in level.face_edits() {
            write_count(&mut writer, face_edit.control_face() as usize, "control face")?;
            write_count(&mut writer, face_edit.vertex_edits().len(), "vertex edit count")?;

            for vertex_edit in face_edit.vertex_edits() {
                let bits = vertex_edit.packed_path().bits();
                let delta = vertex_edit.delta();
                writer.write_f32::<LittleEndian>(delta.x)?;
                if has_long_paths(index) {
                    writer.write_u16::<LittleEndian>(bits as u16)?;
                }
                writer.write_u16::<LittleEndian>((bits >> 16) as u16)?;
                writer.write_f32::<LittleEndian>(delta.y)?;
                writer.write_f32::<LittleEndian>(delta.z)?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Loads a `.dhdm` file.
///
/// Unlike [`read()`] this fails if anything follows the last level.
pub fn load(path: impl AsRef<Path>) -> Result<HdMorph> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let mut cursor = Cursor::new(bytes.as_slice());

    let morph = read(&mut cursor)?;

    let trailing = bytes.len() - cursor.position() as usize;
    if 0 != trailing {
        return Err(Error::InvalidFormat(format!(
            "{} trailing bytes after the last level",
            trailing
        )));
    }

    debug!(path = %path.display(), "loaded HD morph");
    Ok(morph)
}

/// Saves `morph` as a `.dhdm` file, replacing any existing file.
///
/// A morph [`write()`] rejects leaves the file system untouched.
pub fn save(morph: &HdMorph, path: impl AsRef<Path>) -> Result<()> {
    check_path_lengths(morph)?;
    write(morph, BufWriter::new(File::create(path)?))
}
