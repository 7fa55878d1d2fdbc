/// Stream decoding and decompression utilities.
///
/// PDF streams can be compressed and/or encoded with a chain of filters.
/// This module decodes each of the filters a conforming reader needs to
/// support for correct round-tripping, plus the encode-side counterpart to
/// FlateDecode needed when writing new or modified stream content.
use super::error::{PDFError, PDFResult};
use super::parser::PDFObject;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Decodes a FlateDecode (zlib/deflate) compressed stream.
///
/// Tries zlib framing first (the conforming form); some producers emit raw
/// deflate without the zlib header, so that's tried as a fallback before
/// giving up.
pub fn decode_flate(compressed_data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut decompressed = Vec::new();
    let mut decoder = ZlibDecoder::new(compressed_data);
    if decoder.read_to_end(&mut decompressed).is_ok() {
        return Ok(decompressed);
    }

    decompressed.clear();
    let mut raw_decoder = DeflateDecoder::new(compressed_data);
    raw_decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| PDFError::filter_error(format!("FlateDecode error: {e}")))?;

    Ok(decompressed)
}

/// Encodes data with FlateDecode (zlib), for writing new or re-filtered
/// stream content.
pub fn encode_flate(data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PDFError::filter_error(format!("FlateDecode encode error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| PDFError::filter_error(format!("FlateDecode encode error: {e}")))
}

/// Applies PNG predictor decoding (Predictor values 10-14) to already
/// Flate/LZW-decompressed data, reversing the per-row prediction used to
/// improve compressibility of image and xref-stream data.
pub fn decode_png_predictor(
    data: &[u8],
    colors: usize,
    bits_per_component: usize,
    columns: usize,
) -> PDFResult<Vec<u8>> {
    let pix_bytes = (colors * bits_per_component + 7) / 8;
    let row_bytes = (columns * colors * bits_per_component + 7) / 8;
    let stride = 1 + row_bytes;

    if stride == 0 || data.len() % stride != 0 {
        return Err(PDFError::filter_error(format!(
            "PNG predictor data size mismatch: {} bytes doesn't divide evenly by stride {}",
            data.len(),
            stride
        )));
    }
    let num_rows = data.len() / stride;

    let mut output = Vec::with_capacity(num_rows * row_bytes);
    let mut prev_row = vec![0u8; row_bytes];

    for row_idx in 0..num_rows {
        let row_start = row_idx * stride;
        let predictor_byte = data[row_start];
        let raw_bytes = &data[row_start + 1..row_start + 1 + row_bytes];

        match predictor_byte {
            0 => {
                output.extend_from_slice(raw_bytes);
                prev_row.copy_from_slice(raw_bytes);
            }
            1 => {
                for i in 0..pix_bytes.min(row_bytes) {
                    let val = raw_bytes[i];
                    output.push(val);
                    prev_row[i] = val;
                }
                for i in pix_bytes..row_bytes {
                    let val = output[output.len() - pix_bytes].wrapping_add(raw_bytes[i]);
                    output.push(val);
                    prev_row[i] = val;
                }
            }
            2 => {
                for i in 0..row_bytes {
                    let val = prev_row[i].wrapping_add(raw_bytes[i]);
                    output.push(val);
                    prev_row[i] = val;
                }
            }
            3 => {
                for i in 0..pix_bytes.min(row_bytes) {
                    let val = ((prev_row[i] as u16 / 2) as u8).wrapping_add(raw_bytes[i]);
                    output.push(val);
                    prev_row[i] = val;
                }
                for i in pix_bytes..row_bytes {
                    let left = output[output.len() - pix_bytes] as u16;
                    let up = prev_row[i] as u16;
                    let avg = ((left + up) / 2) as u8;
                    let val = avg.wrapping_add(raw_bytes[i]);
                    output.push(val);
                    prev_row[i] = val;
                }
            }
            4 => {
                for i in 0..pix_bytes.min(row_bytes) {
                    let up = prev_row[i];
                    let val = up.wrapping_add(raw_bytes[i]);
                    output.push(val);
                    prev_row[i] = val;
                }
                for i in pix_bytes..row_bytes {
                    let left = output[output.len() - pix_bytes];
                    let up = prev_row[i];
                    let up_left = prev_row[i - pix_bytes];

                    let p = (left as i32) + (up as i32) - (up_left as i32);
                    let pa = (p - left as i32).abs();
                    let pb = (p - up as i32).abs();
                    let pc = (p - up_left as i32).abs();

                    let paeth = if pa <= pb && pa <= pc {
                        left
                    } else if pb <= pc {
                        up
                    } else {
                        up_left
                    };

                    let val = paeth.wrapping_add(raw_bytes[i]);
                    output.push(val);
                    prev_row[i] = val;
                }
            }
            other => {
                return Err(PDFError::filter_error(format!(
                    "unsupported PNG predictor tag: {other}"
                )));
            }
        }
    }

    Ok(output)
}

/// Applies TIFF predictor 2 (horizontal differencing), reversed in place.
/// Only 8-bit-per-component data is supported; anything else is a filter
/// error rather than a silent no-op, since getting this wrong corrupts the
/// stream.
pub fn decode_tiff_predictor(
    data: &[u8],
    colors: usize,
    bits_per_component: usize,
    columns: usize,
) -> PDFResult<Vec<u8>> {
    if bits_per_component != 8 {
        return Err(PDFError::filter_error(format!(
            "TIFF predictor only supported for 8-bit components, got {bits_per_component}"
        )));
    }

    let row_bytes = columns * colors;
    if row_bytes == 0 || data.len() % row_bytes != 0 {
        return Err(PDFError::filter_error(format!(
            "TIFF predictor data size mismatch: {} bytes doesn't divide evenly by row width {}",
            data.len(),
            row_bytes
        )));
    }

    let mut output = data.to_vec();
    for row in output.chunks_mut(row_bytes) {
        for i in colors..row.len() {
            row[i] = row[i].wrapping_add(row[i - colors]);
        }
    }

    Ok(output)
}

/// Decodes ASCIIHex-encoded data. Whitespace is ignored; a trailing '>'
/// terminates the data; an odd trailing hex digit is padded with an
/// implicit 0, per spec.
pub fn decode_ascii_hex(data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut result = Vec::new();
    let mut hex_buffer = String::new();

    for &byte in data {
        let ch = byte as char;
        if ch.is_ascii_hexdigit() {
            hex_buffer.push(ch);
            if hex_buffer.len() == 2 {
                if let Ok(byte_val) = u8::from_str_radix(&hex_buffer, 16) {
                    result.push(byte_val);
                }
                hex_buffer.clear();
            }
        } else if ch == '>' {
            break;
        }
    }

    if !hex_buffer.is_empty() {
        if let Ok(byte_val) = u8::from_str_radix(&format!("{hex_buffer}0"), 16) {
            result.push(byte_val);
        }
    }

    Ok(result)
}

/// Decodes ASCII85-encoded data, including the `z` all-zero-group shortcut
/// and the trailing `~>` end-of-data marker.
pub fn decode_ascii85(data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut result = Vec::new();
    let mut tuple = 0u32;
    let mut count = 0usize;

    for &byte in data {
        let ch = byte as char;

        if ch == '~' || ch == '>' {
            break;
        } else if ch == 'z' {
            if count == 0 {
                result.extend_from_slice(&[0u8; 4]);
                continue;
            }
            return Err(PDFError::filter_error(
                "ASCII85 'z' shortcut may only appear at a group boundary".to_string(),
            ));
        } else if ch.is_whitespace() {
            continue;
        } else if ('!'..='u').contains(&ch) {
            let value = (ch as u32) - ('!' as u32);
            tuple = tuple.wrapping_mul(85).wrapping_add(value);
            count += 1;

            if count == 5 {
                result.push(((tuple >> 24) & 0xFF) as u8);
                result.push(((tuple >> 16) & 0xFF) as u8);
                result.push(((tuple >> 8) & 0xFF) as u8);
                result.push((tuple & 0xFF) as u8);
                tuple = 0;
                count = 0;
            }
        } else {
            return Err(PDFError::filter_error(format!("invalid ASCII85 character: '{ch}'")));
        }
    }

    if count > 0 {
        for _ in count..5 {
            tuple = tuple.wrapping_mul(85);
        }
        let bytes = [
            ((tuple >> 24) & 0xFF) as u8,
            ((tuple >> 16) & 0xFF) as u8,
            ((tuple >> 8) & 0xFF) as u8,
            (tuple & 0xFF) as u8,
        ];
        result.extend_from_slice(&bytes[..(count - 1)]);
    }

    Ok(result)
}

/// Decodes RunLengthDecode data: a length byte `0..=127` means copy the
/// following `length + 1` literal bytes; `129..=255` means repeat the
/// single following byte `257 - length` times; `128` is the end-of-data
/// marker.
pub fn decode_run_length(data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut output = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let length = data[i];
        i += 1;

        if length == 128 {
            break;
        } else if length < 128 {
            let count = length as usize + 1;
            if i + count > data.len() {
                return Err(PDFError::filter_error(
                    "RunLengthDecode literal run exceeds available data".to_string(),
                ));
            }
            output.extend_from_slice(&data[i..i + count]);
            i += count;
        } else {
            if i >= data.len() {
                return Err(PDFError::filter_error(
                    "RunLengthDecode repeat run missing its byte".to_string(),
                ));
            }
            let count = 257 - length as usize;
            output.extend(std::iter::repeat(data[i]).take(count));
            i += 1;
        }
    }

    Ok(output)
}

/// Decodes LZWDecode data using the PDF/TIFF variant of LZW (codes start at
/// 9 bits and grow to 12, with an explicit clear code 256 and end-of-data
/// code 257). `early_change` (default 1 per spec) controls whether the code
/// width grows one code early, matching the encoder's behavior.
pub fn decode_lzw(data: &[u8], early_change: bool) -> PDFResult<Vec<u8>> {
    const CLEAR_TABLE: u16 = 256;
    const EOD: u16 = 257;

    let mut output = Vec::new();
    let mut table: Vec<Vec<u8>> = Vec::new();
    let mut code_width = 9u32;
    let mut bit_pos = 0usize;
    let total_bits = data.len() * 8;

    let reset_table = |table: &mut Vec<Vec<u8>>| {
        table.clear();
        for b in 0..256u16 {
            table.push(vec![b as u8]);
        }
        table.push(Vec::new()); // 256: clear table (placeholder, never read)
        table.push(Vec::new()); // 257: end of data (placeholder, never read)
    };
    reset_table(&mut table);

    let read_code = |data: &[u8], bit_pos: usize, width: u32| -> Option<u16> {
        if bit_pos + width as usize > total_bits {
            return None;
        }
        let mut code = 0u16;
        for i in 0..width {
            let bit_idx = bit_pos + i as usize;
            let byte = data[bit_idx / 8];
            let bit = (byte >> (7 - (bit_idx % 8))) & 1;
            code = (code << 1) | bit as u16;
        }
        Some(code)
    };

    let mut prev: Option<Vec<u8>> = None;

    loop {
        let Some(code) = read_code(data, bit_pos, code_width) else {
            break;
        };
        bit_pos += code_width as usize;

        if code == CLEAR_TABLE {
            reset_table(&mut table);
            code_width = 9;
            prev = None;
            continue;
        }
        if code == EOD {
            break;
        }

        let entry = if (code as usize) < table.len() {
            table[code as usize].clone()
        } else if let Some(p) = &prev {
            let mut e = p.clone();
            e.push(p[0]);
            e
        } else {
            return Err(PDFError::filter_error(format!(
                "LZWDecode: invalid code {code} with no preceding entry"
            )));
        };

        output.extend_from_slice(&entry);

        if let Some(p) = prev {
            let mut new_entry = p;
            new_entry.push(entry[0]);
            table.push(new_entry);
        }
        prev = Some(entry);

        let threshold = if early_change { 1 } else { 0 };
        let table_len = table.len() as u16;
        if table_len + threshold >= (1 << code_width) && code_width < 12 {
            code_width += 1;
        }
    }

    Ok(output)
}

/// Decodes a stream based on a single filter name. Used where only one
/// filter applies (e.g. xref and object streams, which never chain
/// filters in practice).
pub fn decode_stream(data: &[u8], filter_name: Option<&str>) -> PDFResult<Vec<u8>> {
    match filter_name {
        Some(name) => apply_filter(data, name),
        None => Ok(data.to_vec()),
    }
}

/// Applies a single named filter to data. `Crypt` is a deliberate
/// passthrough: decryption already happens at the object level via the
/// parser's `DecryptionHook`, keyed by indirect object rather than by
/// filter stage, so by the time a `/Crypt` entry is seen the bytes are
/// already plaintext.
fn apply_filter(data: &[u8], filter_name: &str) -> PDFResult<Vec<u8>> {
    match filter_name {
        "FlateDecode" | "Fl" => decode_flate(data),
        "ASCIIHexDecode" | "AHx" => decode_ascii_hex(data),
        "ASCII85Decode" | "A85" => decode_ascii85(data),
        "RunLengthDecode" | "RL" => decode_run_length(data),
        "LZWDecode" | "LZW" => decode_lzw(data, true),
        "Crypt" => Ok(data.to_vec()),
        other => Err(PDFError::filter_error(format!("unsupported filter: {other}"))),
    }
}

fn predictor_params(parms: Option<&PDFObject>) -> (i64, usize, usize, usize) {
    let dict = match parms.and_then(PDFObject::as_dictionary) {
        Some(d) => d,
        None => return (1, 1, 8, 1),
    };
    let predictor = dict.get("Predictor").and_then(PDFObject::as_i64).unwrap_or(1);
    let colors = dict.get("Colors").and_then(PDFObject::as_i64).unwrap_or(1) as usize;
    let bits_per_component = dict
        .get("BitsPerComponent")
        .and_then(PDFObject::as_i64)
        .unwrap_or(8) as usize;
    let columns = dict.get("Columns").and_then(PDFObject::as_i64).unwrap_or(1) as usize;
    (predictor, colors, bits_per_component, columns)
}

/// Applies the predictor named in a `/DecodeParms` dictionary, if any.
/// Predictor 1 (or absent) is a no-op; 2 is TIFF; 10-15 are the PNG
/// variants (the specific tag is read per-row from the data itself).
fn apply_predictor(data: Vec<u8>, parms: Option<&PDFObject>) -> PDFResult<Vec<u8>> {
    let (predictor, colors, bits_per_component, columns) = predictor_params(parms);
    match predictor {
        1 => Ok(data),
        2 => decode_tiff_predictor(&data, colors, bits_per_component, columns),
        10..=15 => decode_png_predictor(&data, colors, bits_per_component, columns),
        other => Err(PDFError::filter_error(format!("unsupported predictor: {other}"))),
    }
}

/// Applies a chain of filters described by a stream dictionary's `/Filter`
/// (a name or array of names) and `/DecodeParms` (a dictionary, or an
/// array aligned with `/Filter`), in the order the PDF spec requires:
/// filters are listed encode-first, so decoding runs through the array in
/// forward order (the opposite of the encoding order), each stage applying
/// its own predictor immediately afterward if one was given.
pub fn apply_filters(
    data: &[u8],
    filter: Option<&PDFObject>,
    decode_parms: Option<&PDFObject>,
) -> PDFResult<Vec<u8>> {
    let filter_list: Vec<String> = match filter {
        Some(PDFObject::Name(name)) => vec![name.clone()],
        Some(PDFObject::Array(arr)) => arr
            .iter()
            .filter_map(|item| match &**item {
                PDFObject::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => return Ok(data.to_vec()),
    };

    if filter_list.is_empty() {
        return Ok(data.to_vec());
    }

    let parms_list: Vec<Option<&PDFObject>> = match decode_parms {
        Some(PDFObject::Array(arr)) => arr.iter().map(|item| Some(&**item)).collect(),
        Some(other) => vec![Some(other)],
        None => Vec::new(),
    };

    let mut current = data.to_vec();
    for (i, filter_name) in filter_list.iter().enumerate() {
        current = apply_filter(&current, filter_name)
            .map_err(|e| PDFError::filter_error(format!("filter {filter_name} failed: {e}")))?;
        let parms = parms_list.get(i).copied().flatten();
        if matches!(filter_name.as_str(), "FlateDecode" | "Fl" | "LZWDecode" | "LZW") {
            current = apply_predictor(current, parms)?;
        }
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_flate_simple() {
        let original = b"Hello, PDF world! This is test data.";
        let compressed = encode_flate(original).unwrap();
        let decompressed = decode_flate(&compressed).unwrap();
        assert_eq!(&decompressed[..], original);
    }

    #[test]
    fn test_decode_stream_with_flate() {
        let original = b"Test data for stream decoding";
        let compressed = encode_flate(original).unwrap();
        let decompressed = decode_stream(&compressed, Some("FlateDecode")).unwrap();
        assert_eq!(&decompressed[..], original);
    }

    #[test]
    fn test_decode_stream_no_filter() {
        let original = b"Uncompressed data";
        let result = decode_stream(original, None).unwrap();
        assert_eq!(&result[..], original);
    }

    #[test]
    fn test_decode_stream_unsupported_filter() {
        let data = b"some data";
        assert!(decode_stream(data, Some("UnsupportedFilter")).is_err());
    }

    #[test]
    fn test_decode_ascii_hex_simple() {
        let decoded = decode_ascii_hex(b"48656C6C6F").unwrap();
        assert_eq!(decoded, b"Hello");
    }

    #[test]
    fn test_decode_ascii_hex_with_whitespace() {
        let decoded = decode_ascii_hex(b"48 65\n6C\t6C 6F>").unwrap();
        assert_eq!(decoded, b"Hello");
    }

    #[test]
    fn test_decode_ascii_hex_odd_length() {
        let decoded = decode_ascii_hex(b"48656C6C").unwrap();
        assert_eq!(decoded, b"Hell");
    }

    #[test]
    fn test_decode_ascii85_simple() {
        let decoded = decode_ascii85(b"87cURD").unwrap();
        assert_eq!(decoded, b"Hell");
    }

    #[test]
    fn test_decode_ascii85_with_whitespace() {
        let decoded = decode_ascii85(b"87cURD~>").unwrap();
        assert_eq!(decoded, b"Hell");
    }

    #[test]
    fn test_decode_ascii85_zero_shortcut() {
        let decoded = decode_ascii85(b"z").unwrap();
        assert_eq!(decoded, b"\0\0\0\0");
    }

    #[test]
    fn test_decode_run_length_literal_and_repeat() {
        // literal "Hi" (length byte 1 = 2 bytes), then repeat 'x' 4 times (length byte 253), then EOD
        let encoded = [&[1u8, b'H', b'i'][..], &[253u8, b'x'], &[128u8]].concat();
        let decoded = decode_run_length(&encoded).unwrap();
        assert_eq!(decoded, b"Hixxxx");
    }

    #[test]
    fn test_decode_tiff_predictor_horizontal_difference() {
        // 2 rows, 1 color, 8bpc, 3 columns: row deltas [10,1,1] and [5,0,0]
        let data = vec![10, 1, 1, 5, 0, 0];
        let decoded = decode_tiff_predictor(&data, 1, 8, 3).unwrap();
        assert_eq!(decoded, vec![10, 11, 12, 5, 5, 5]);
    }

    #[test]
    fn test_decode_lzw_roundtrip_against_known_vector() {
        // "-----A---B" encoded with PDF-variant LZW (early_change=1), a
        // vector commonly used to validate LZW decoders.
        let encoded = [0x80, 0x0B, 0x60, 0x50, 0x22, 0x0C, 0x0C, 0x85, 0x01];
        let decoded = decode_lzw(&encoded, true).unwrap();
        assert_eq!(decoded, b"-----A---B");
    }

    #[test]
    fn test_multi_filter_flate_ascii_hex() {
        let original = b"Hello, World! Testing multi-filter decode.";
        let compressed = encode_flate(original).unwrap();
        let hex_encoded = hex::encode_upper(&compressed);

        let filters = PDFObject::Array(smallvec::smallvec![
            Box::new(PDFObject::Name("FlateDecode".into())),
            Box::new(PDFObject::Name("ASCIIHexDecode".into())),
        ]);

        let decoded = apply_filters(hex_encoded.as_bytes(), Some(&filters), None).unwrap();
        assert_eq!(&decoded[..], original);
    }

    #[test]
    fn test_apply_filters_with_predictor() {
        let raw = vec![1u8, 2, 3, 4]; // one PNG-"None" row, 4 bytes, 4 columns, 1 color
        let mut tagged = vec![0u8]; // predictor tag 0 = None
        tagged.extend_from_slice(&raw);
        let compressed = encode_flate(&tagged).unwrap();

        let mut parms = std::collections::HashMap::new();
        parms.insert("Predictor".to_string(), PDFObject::Integer(12));
        parms.insert("Columns".to_string(), PDFObject::Integer(4));

        let decoded = apply_filters(
            &compressed,
            Some(&PDFObject::Name("FlateDecode".to_string())),
            Some(&PDFObject::Dictionary(parms)),
        )
        .unwrap();

        assert_eq!(decoded, raw);
    }
}
