//!
//! FITS adapter (M8): the one external-collaborator contract the core
//! spec describes but does not implement. `BasicFitsAdapter` reads and
//! writes the minimal binary-table layout real HEALPix FITS maps use
//! (header cards in 80-byte records packed into 2880-byte blocks, a single
//! binary-table HDU, one or three `D`/`E` columns), following the card
//! scanning style of the `cds-astro` skymap reader (80-byte cards ending
//! at `END`, `NAXIS1`/`NAXIS2`/`TFORMn` driving the row layout) with
//! `byteorder` doing the big-endian decode FITS mandates.
//!
use std::collections::BTreeMap;
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::FitsError;
use crate::map::{CoordinateSystem, Map, Ordering, PolarizationMaps};
use crate::nside::Nside;

const BLOCK_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;

struct Header {
    cards: BTreeMap<String, String>,
}

impl Header {
    fn parse<R: Read>(reader: &mut R) -> Result<Self, FitsError> {
        let mut cards = BTreeMap::new();
        loop {
            let mut block = [0u8; BLOCK_SIZE];
            reader.read_exact(&mut block)?;
            let mut done = false;
            for chunk in block.chunks_exact(CARD_SIZE) {
                let card = std::str::from_utf8(chunk)
                    .map_err(|_| FitsError::Header("non-ASCII header card".into()))?;
                let keyword = card[0..8].trim().to_string();
                if keyword == "END" {
                    done = true;
                    break;
                }
                if keyword.is_empty() || !card[8..10].starts_with('=') {
                    continue;
                }
                let rest = &card[10..];
                let value = parse_card_value(rest);
                cards.insert(keyword, value);
            }
            if done {
                break;
            }
        }
        Ok(Header { cards })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.cards.get(key).map(|s| s.as_str())
    }

    fn get_u32(&self, key: &str) -> Result<u32, FitsError> {
        self.get(key)
            .ok_or_else(|| FitsError::Header(format!("missing keyword {key}")))?
            .trim()
            .parse()
            .map_err(|_| FitsError::Header(format!("keyword {key} is not an integer")))
    }
}

fn parse_card_value(rest: &str) -> String {
    let trimmed = rest.trim();
    if let Some(stripped) = trimmed.strip_prefix('\'') {
        // Quoted string value: take up to the closing quote, ignore the
        // trailing comment.
        if let Some(end) = stripped.find('\'') {
            return stripped[..end].trim_end().to_string();
        }
        return stripped.trim_end().to_string();
    }
    // Numeric or logical value: stop at the comment marker.
    let value_part = trimmed.split('/').next().unwrap_or(trimmed);
    value_part.trim().to_string()
}

fn ordering_from_str(s: &str) -> Result<Ordering, FitsError> {
    match s.trim() {
        "RING" => Ok(Ordering::Ring),
        "NESTED" | "NEST" => Ok(Ordering::Nested),
        other => Err(FitsError::UnsupportedLayout(format!(
            "unrecognized ORDERING value '{other}'"
        ))),
    }
}

fn coordsys_from_str(s: &str) -> CoordinateSystem {
    match s.trim() {
        "E" => CoordinateSystem::Ecliptic,
        "G" => CoordinateSystem::Galactic,
        "C" => CoordinateSystem::Celestial,
        _ => CoordinateSystem::Custom,
    }
}

/// One `TFORMn` code this adapter understands: `D` (IEEE double) or `E`
/// (IEEE single, upcast to `f64` on read).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ColumnFormat {
    Double,
    Single,
}

fn column_format(tform: &str) -> Result<ColumnFormat, FitsError> {
    match tform.trim() {
        "D" | "1D" => Ok(ColumnFormat::Double),
        "E" | "1E" => Ok(ColumnFormat::Single),
        other => Err(FitsError::UnsupportedLayout(format!(
            "unsupported TFORM '{other}' (only D/E scalar columns are supported)"
        ))),
    }
}

fn read_sample<R: Read>(reader: &mut R, fmt: ColumnFormat) -> Result<f64, FitsError> {
    Ok(match fmt {
        ColumnFormat::Double => reader.read_f64::<BigEndian>()?,
        ColumnFormat::Single => reader.read_f32::<BigEndian>()? as f64,
    })
}

/// Reads the primary HDU's header (asserted empty of data) and the single
/// binary-table extension that follows it, interpreting 1- or 3-column
/// `D`/`E` rows as map pixel values in row order.
pub struct BasicFitsAdapter;

struct TableLayout {
    nside: Nside,
    ordering: Ordering,
    coordinate_system: CoordinateSystem,
    n_rows: u64,
    column_formats: Vec<ColumnFormat>,
}

impl BasicFitsAdapter {
    pub fn new() -> Self {
        BasicFitsAdapter
    }

    fn read_layout<R: Read>(reader: &mut R) -> Result<TableLayout, FitsError> {
        let primary = Header::parse(reader)?;
        if primary.get("SIMPLE").is_none() {
            return Err(FitsError::Header("missing SIMPLE primary HDU".into()));
        }
        let naxis = primary.get_u32("NAXIS").unwrap_or(0);
        if naxis != 0 {
            return Err(FitsError::UnsupportedLayout(
                "primary HDU must carry no data (NAXIS=0)".into(),
            ));
        }

        let ext = Header::parse(reader)?;
        if ext.get("XTENSION") != Some("BINTABLE") {
            return Err(FitsError::UnsupportedLayout(
                "expected a single BINTABLE extension".into(),
            ));
        }
        let n_rows = ext.get_u32("NAXIS2")? as u64;
        let tfields = ext.get_u32("TFIELDS")?;

        let mut column_formats = Vec::with_capacity(tfields as usize);
        for i in 1..=tfields {
            let tform = ext
                .get(&format!("TFORM{i}"))
                .ok_or_else(|| FitsError::Header(format!("missing TFORM{i}")))?;
            column_formats.push(column_format(tform)?);
        }

        let nside_raw = ext.get_u32("NSIDE")?;
        let nside = Nside::new(nside_raw)
            .ok_or_else(|| FitsError::Header(format!("NSIDE {nside_raw} is not a power of two")))?;
        let ordering = ordering_from_str(
            ext.get("ORDERING")
                .ok_or_else(|| FitsError::Header("missing ORDERING".into()))?,
        )?;
        let coordinate_system = ext
            .get("COORDSYS")
            .map(coordsys_from_str)
            .unwrap_or(CoordinateSystem::Custom);

        Ok(TableLayout {
            nside,
            ordering,
            coordinate_system,
            n_rows,
            column_formats,
        })
    }

    /// Loads a single pixel column (1-based) into a `Map`.
    pub fn load_component<R: Read>(&self, reader: &mut R, column: usize) -> Result<Map, FitsError> {
        let layout = Self::read_layout(reader)?;
        if column == 0 || column > layout.column_formats.len() {
            return Err(FitsError::UnsupportedLayout(format!(
                "column {column} out of range (table has {} columns)",
                layout.column_formats.len()
            )));
        }
        if layout.n_rows != layout.nside.npix() {
            return Err(FitsError::Header(format!(
                "NAXIS2 ({}) does not match Npix(NSIDE={}) = {}",
                layout.n_rows,
                layout.nside.get(),
                layout.nside.npix()
            )));
        }

        let mut pixels = Vec::with_capacity(layout.n_rows as usize);
        for _ in 0..layout.n_rows {
            let mut wanted = None;
            for (idx, fmt) in layout.column_formats.iter().enumerate() {
                let value = read_sample(reader, *fmt)?;
                if idx + 1 == column {
                    wanted = Some(value);
                }
            }
            pixels.push(wanted.expect("column index validated above"));
        }

        Map::new(layout.nside, layout.ordering, layout.coordinate_system, pixels)
            .map_err(FitsError::Healpix)
    }

    /// Loads a three-column (I, Q, U) binary table into co-registered
    /// maps.
    pub fn load_polarization<R: Read>(&self, reader: &mut R) -> Result<PolarizationMaps, FitsError> {
        let layout = Self::read_layout(reader)?;
        if layout.column_formats.len() != 3 {
            return Err(FitsError::UnsupportedLayout(format!(
                "polarization table must have 3 columns, found {}",
                layout.column_formats.len()
            )));
        }
        if layout.n_rows != layout.nside.npix() {
            return Err(FitsError::Header(format!(
                "NAXIS2 ({}) does not match Npix(NSIDE={}) = {}",
                layout.n_rows,
                layout.nside.get(),
                layout.nside.npix()
            )));
        }

        let mut i = Vec::with_capacity(layout.n_rows as usize);
        let mut q = Vec::with_capacity(layout.n_rows as usize);
        let mut u = Vec::with_capacity(layout.n_rows as usize);
        for _ in 0..layout.n_rows {
            i.push(read_sample(reader, layout.column_formats[0])?);
            q.push(read_sample(reader, layout.column_formats[1])?);
            u.push(read_sample(reader, layout.column_formats[2])?);
        }

        let make = |pixels| Map::new(layout.nside, layout.ordering, layout.coordinate_system, pixels);
        PolarizationMaps::new(make(i)?, make(q)?, make(u)?).map_err(FitsError::Healpix)
    }

    /// Writes `map` as a single-column (`TFORM1 = 'D'`) binary table: a
    /// minimal empty primary HDU followed by the BINTABLE extension.
    pub fn save_component<W: Write>(
        &self,
        writer: &mut W,
        map: &Map,
        unit: &str,
    ) -> Result<(), FitsError> {
        let npix = map.npix();
        let mut primary = Vec::new();
        write_card(&mut primary, "SIMPLE", "T");
        write_card(&mut primary, "BITPIX", "8");
        write_card(&mut primary, "NAXIS", "0");
        write_card(&mut primary, "EXTEND", "T");
        write_end(&mut primary);
        writer.write_all(&primary)?;

        let mut ext = Vec::new();
        write_card(&mut ext, "XTENSION", "'BINTABLE'");
        write_card(&mut ext, "BITPIX", "8");
        write_card(&mut ext, "NAXIS", "2");
        write_card(&mut ext, "NAXIS1", "8");
        write_card(&mut ext, "NAXIS2", &npix.to_string());
        write_card(&mut ext, "PCOUNT", "0");
        write_card(&mut ext, "GCOUNT", "1");
        write_card(&mut ext, "TFIELDS", "1");
        write_card(&mut ext, "TTYPE1", "'SIGNAL  '");
        write_card(&mut ext, "TFORM1", "'D       '");
        write_card(&mut ext, "TUNIT1", &format!("'{unit:<8}'"));
        write_card(&mut ext, "PIXTYPE", "'HEALPIX '");
        write_card(
            &mut ext,
            "ORDERING",
            match map.ordering() {
                Ordering::Ring => "'RING    '",
                Ordering::Nested => "'NESTED  '",
            },
        );
        write_card(&mut ext, "NSIDE", &map.nside().get().to_string());
        write_card(
            &mut ext,
            "COORDSYS",
            match map.coordinate_system() {
                CoordinateSystem::Ecliptic => "'E       '",
                CoordinateSystem::Galactic => "'G       '",
                CoordinateSystem::Celestial => "'C       '",
                CoordinateSystem::Custom => "'        '",
            },
        );
        write_end(&mut ext);
        writer.write_all(&ext)?;

        for &value in map.pixels() {
            writer.write_f64::<BigEndian>(value)?;
        }
        let data_len = npix * 8;
        let padded = data_len.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64;
        let padding = vec![0u8; (padded - data_len) as usize];
        writer.write_all(&padding)?;
        Ok(())
    }

    /// Writes a three-column (I, Q, U) `D`-format binary table, the
    /// format `load_polarization` reads back.
    pub fn save_polarization<W: Write>(&self, writer: &mut W, maps: &PolarizationMaps) -> Result<(), FitsError> {
        let npix = maps.i.npix();
        let mut primary = Vec::new();
        write_card(&mut primary, "SIMPLE", "T");
        write_card(&mut primary, "BITPIX", "8");
        write_card(&mut primary, "NAXIS", "0");
        write_card(&mut primary, "EXTEND", "T");
        write_end(&mut primary);
        writer.write_all(&primary)?;

        let mut ext = Vec::new();
        write_card(&mut ext, "XTENSION", "'BINTABLE'");
        write_card(&mut ext, "BITPIX", "8");
        write_card(&mut ext, "NAXIS", "2");
        write_card(&mut ext, "NAXIS1", "24");
        write_card(&mut ext, "NAXIS2", &npix.to_string());
        write_card(&mut ext, "PCOUNT", "0");
        write_card(&mut ext, "GCOUNT", "1");
        write_card(&mut ext, "TFIELDS", "3");
        write_card(&mut ext, "TTYPE1", "'I       '");
        write_card(&mut ext, "TFORM1", "'D       '");
        write_card(&mut ext, "TTYPE2", "'Q       '");
        write_card(&mut ext, "TFORM2", "'D       '");
        write_card(&mut ext, "TTYPE3", "'U       '");
        write_card(&mut ext, "TFORM3", "'D       '");
        write_card(&mut ext, "PIXTYPE", "'HEALPIX '");
        write_card(
            &mut ext,
            "ORDERING",
            match maps.i.ordering() {
                Ordering::Ring => "'RING    '",
                Ordering::Nested => "'NESTED  '",
            },
        );
        write_card(&mut ext, "NSIDE", &maps.i.nside().get().to_string());
        write_card(
            &mut ext,
            "COORDSYS",
            match maps.i.coordinate_system() {
                CoordinateSystem::Ecliptic => "'E       '",
                CoordinateSystem::Galactic => "'G       '",
                CoordinateSystem::Celestial => "'C       '",
                CoordinateSystem::Custom => "'        '",
            },
        );
        write_end(&mut ext);
        writer.write_all(&ext)?;

        for idx in 0..npix as usize {
            writer.write_f64::<BigEndian>(maps.i.pixels()[idx])?;
            writer.write_f64::<BigEndian>(maps.q.pixels()[idx])?;
            writer.write_f64::<BigEndian>(maps.u.pixels()[idx])?;
        }
        let data_len = npix * 24;
        let padded = data_len.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64;
        let padding = vec![0u8; (padded - data_len) as usize];
        writer.write_all(&padding)?;
        Ok(())
    }
}

impl Default for BasicFitsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_card(buf: &mut Vec<u8>, keyword: &str, value: &str) {
    let card = format!("{keyword:<8}= {value:<70}");
    let mut bytes = card.into_bytes();
    bytes.truncate(CARD_SIZE);
    while bytes.len() < CARD_SIZE {
        bytes.push(b' ');
    }
    buf.extend_from_slice(&bytes);
}

fn write_end(buf: &mut Vec<u8>) {
    let mut end = b"END".to_vec();
    end.resize(CARD_SIZE, b' ');
    buf.extend_from_slice(&end);
    let remainder = buf.len() % BLOCK_SIZE;
    if remainder != 0 {
        buf.extend(std::iter::repeat(b' ').take(BLOCK_SIZE - remainder));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_single_column_map() {
        let nside = Nside::new(4).unwrap();
        let mut map = Map::zeros(nside, Ordering::Ring, CoordinateSystem::Galactic);
        for i in 0..map.npix() {
            map.pixels_mut()[i as usize] = i as f64 * 0.5;
        }

        let adapter = BasicFitsAdapter::new();
        let mut buf = Vec::new();
        adapter.save_component(&mut buf, &map, "K_CMB").unwrap();

        let mut cursor = Cursor::new(buf);
        let loaded = adapter.load_component(&mut cursor, 1).unwrap();
        assert_eq!(loaded.nside(), nside);
        assert_eq!(loaded.ordering(), Ordering::Ring);
        assert_eq!(loaded.pixels(), map.pixels());
    }

    #[test]
    fn rejects_column_out_of_range() {
        let nside = Nside::new(2).unwrap();
        let map = Map::zeros(nside, Ordering::Nested, CoordinateSystem::Custom);
        let adapter = BasicFitsAdapter::new();
        let mut buf = Vec::new();
        adapter.save_component(&mut buf, &map, "").unwrap();
        let mut cursor = Cursor::new(buf);
        assert!(adapter.load_component(&mut cursor, 2).is_err());
    }

    #[test]
    fn parse_card_value_strips_quotes_and_comments() {
        assert_eq!(parse_card_value("'RING    '           / pixel ordering"), "RING");
        assert_eq!(parse_card_value("               8 / bits"), "8");
    }

    #[test]
    fn round_trips_a_polarization_triplet() {
        let nside = Nside::new(4).unwrap();
        let i = {
            let mut m = Map::zeros(nside, Ordering::Ring, CoordinateSystem::Celestial);
            for k in 0..m.npix() {
                m.pixels_mut()[k as usize] = k as f64;
            }
            m
        };
        let q = Map::filled(nside, Ordering::Ring, CoordinateSystem::Celestial, 0.5);
        let u = Map::filled(nside, Ordering::Ring, CoordinateSystem::Celestial, -0.5);
        let maps = PolarizationMaps::new(i, q, u).unwrap();

        let adapter = BasicFitsAdapter::new();
        let mut buf = Vec::new();
        adapter.save_polarization(&mut buf, &maps).unwrap();

        let mut cursor = Cursor::new(buf);
        let loaded = adapter.load_polarization(&mut cursor).unwrap();
        assert_eq!(loaded.i.pixels(), maps.i.pixels());
        assert_eq!(loaded.q.pixels(), maps.q.pixels());
        assert_eq!(loaded.u.pixels(), maps.u.pixels());
    }
}
