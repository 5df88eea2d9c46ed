//! GRD ("DSBB") binary grid format
//!
//! Layout, all little-endian:
//! - 4-byte tag `DSBB`
//! - `i16` width, `i16` height
//! - `f64` minX, maxX, minY, maxY, minZ, maxZ
//! - `width * height` `f32` values, `y` outer, `x` inner

use std::fs;
use std::path::Path;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FormatError, Result};
use crate::types::grid::{GridBounds, GridMap};

/// Header tag
pub const GRD_TAG: [u8; 4] = *b"DSBB";

/// Header size in bytes
pub const HEADER_LEN: usize = 4 + 2 + 2 + 6 * 8;

/// Decode a grid from GRD bytes
pub fn decode_grd(mut buf: impl Buf) -> Result<GridMap> {
    if buf.remaining() < HEADER_LEN {
        return Err(FormatError::UnexpectedEof(format!(
            "GRD header needs {HEADER_LEN} bytes, got {}",
            buf.remaining()
        ))
        .into());
    }

    let mut tag = [0u8; 4];
    buf.copy_to_slice(&mut tag);
    if tag != GRD_TAG {
        return Err(FormatError::InvalidTag(tag).into());
    }

    let width = buf.get_i16_le();
    let height = buf.get_i16_le();
    if width < 0 || height < 0 {
        return Err(FormatError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        }
        .into());
    }
    let (width, height) = (width as usize, height as usize);

    let bounds = GridBounds::new(
        buf.get_f64_le(),
        buf.get_f64_le(),
        buf.get_f64_le(),
        buf.get_f64_le(),
    );
    // minZ / maxZ are recomputed from the values
    let _min_z = buf.get_f64_le();
    let _max_z = buf.get_f64_le();

    let count = width * height;
    if buf.remaining() < count * 4 {
        return Err(FormatError::UnexpectedEof(format!(
            "GRD payload needs {} values, got {} bytes",
            count,
            buf.remaining()
        ))
        .into());
    }

    let values = (0..count).map(|_| buf.get_f32_le() as f64).collect();
    Ok(GridMap::from_values(width, height, bounds, values)?)
}

/// Encode a grid as GRD bytes
pub fn encode_grd(map: &GridMap) -> Result<BytesMut> {
    let width = i16::try_from(map.width()).map_err(|_| FormatError::InvalidDimensions {
        width: map.width() as i64,
        height: map.height() as i64,
    })?;
    let height = i16::try_from(map.height()).map_err(|_| FormatError::InvalidDimensions {
        width: map.width() as i64,
        height: map.height() as i64,
    })?;

    let bounds = map.bounds();
    let mut buf = BytesMut::with_capacity(HEADER_LEN + map.values().len() * 4);
    buf.put_slice(&GRD_TAG);
    buf.put_i16_le(width);
    buf.put_i16_le(height);
    buf.put_f64_le(bounds.min_x);
    buf.put_f64_le(bounds.max_x);
    buf.put_f64_le(bounds.min_y);
    buf.put_f64_le(bounds.max_y);
    buf.put_f64_le(map.min_z());
    buf.put_f64_le(map.max_z());
    for &value in map.values() {
        buf.put_f32_le(value as f32);
    }
    Ok(buf)
}

/// Read a GRD file
pub fn read_grd_file(path: impl AsRef<Path>) -> Result<GridMap> {
    let data = fs::read(path.as_ref())?;
    decode_grd(data.as_slice())
}

/// Write a GRD file
pub fn write_grd_file(map: &GridMap, path: impl AsRef<Path>) -> Result<()> {
    let buf = encode_grd(map)?;
    fs::write(path.as_ref(), &buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FloodplanError;

    fn sample() -> GridMap {
        GridMap::from_values(
            3,
            2,
            GridBounds::new(10.0, 13.0, 20.0, 22.0),
            vec![0.0, 1.5, -2.0, 4.25, GridMap::NO_DATA, 8.0],
        )
        .unwrap()
    }

    #[test]
    fn test_header_layout() {
        let buf = encode_grd(&sample()).unwrap();
        assert_eq!(&buf[..4], b"DSBB");
        assert_eq!(i16::from_le_bytes([buf[4], buf[5]]), 3);
        assert_eq!(i16::from_le_bytes([buf[6], buf[7]]), 2);
        assert_eq!(buf.len(), HEADER_LEN + 6 * 4);
    }

    #[test]
    fn test_encode_decode_preserves_values() {
        let grid = sample();
        let bytes = encode_grd(&grid).unwrap();
        let decoded = decode_grd(&bytes[..]).unwrap();
        assert_eq!(decoded.width(), 3);
        assert_eq!(decoded.height(), 2);
        assert_eq!(decoded.bounds(), grid.bounds());
        assert_eq!(decoded.get(1, 0), Some(1.5));
        assert_eq!(decoded.get(0, 1), Some(4.25));
        assert!(GridMap::is_no_data(decoded.get(1, 1).unwrap()));
    }

    #[test]
    fn test_minmax_written_from_data() {
        let bytes = encode_grd(&sample()).unwrap();
        let mut header = &bytes[8 + 4 * 8..HEADER_LEN];
        assert_eq!(header.get_f64_le(), -2.0);
        assert_eq!(header.get_f64_le(), 8.0);
    }

    #[test]
    fn test_rejects_bad_tag() {
        let mut bytes = encode_grd(&sample()).unwrap();
        bytes[0] = b'X';
        let err = decode_grd(&bytes[..]).unwrap_err();
        assert!(matches!(err, FloodplanError::Format(FormatError::InvalidTag(_))));
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let bytes = encode_grd(&sample()).unwrap();
        let err = decode_grd(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, FloodplanError::Format(FormatError::UnexpectedEof(_))));
    }

    proptest::proptest! {
        #[test]
        fn prop_decode_arbitrary_bytes_never_panics(
            tail in proptest::collection::vec(proptest::num::u8::ANY, 0..256),
            tagged in proptest::bool::ANY,
        ) {
            let mut bytes = if tagged { GRD_TAG.to_vec() } else { Vec::new() };
            bytes.extend(tail);
            let _ = decode_grd(bytes.as_slice());
        }
    }
}
