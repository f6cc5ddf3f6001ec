use dicom::{
    object::{
        DefaultDicomObject, FileMetaTableBuilder, InMemDicomObject, OpenFileOptions,
        file::ReadPreamble,
    },
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder},
    transfer_syntax::entries,
};
use dicom_dictionary_std::{tags, uids};
use ndarray::Array2;
use thiserror::Error;

/// Length of the optional file preamble preceding the `DICM` magic code.
const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";
/// Tag (4 bytes) and value length (4 bytes) of an implicit VR element.
const IMPLICIT_HEADER_LEN: usize = 8;
const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// Reasons a candidate file is left out of a volume without aborting the
/// rest of the batch.
#[derive(Debug, Error)]
pub enum SliceSkipped {
    #[error("file is not a readable DICOM object: {0}")]
    Malformed(#[from] dicom::object::ReadError),

    #[error("dataset could not be wrapped as a DICOM file: {0}")]
    MissingMeta(#[from] dicom::object::WithMetaError),

    #[error("DICOM object carries no pixel data")]
    NoPixelData,

    #[error("pixel data could not be decoded: {0}")]
    Undecodable(#[from] dicom::pixeldata::Error),

    #[error("decoded image is empty ({rows}x{columns})")]
    EmptyImage { rows: u32, columns: u32 },
}

pub struct SliceDecoder;

impl SliceDecoder {
    /// Decode one candidate file into a (height, width) intensity grid.
    ///
    /// The stored pixel values are returned as they are, without modality or
    /// VOI LUT. Multi-frame objects contribute their first frame, and
    /// multi-sample objects their first sample.
    ///
    /// # Errors
    ///
    /// Every failure is a [`SliceSkipped`] reason; callers are expected to
    /// record it and carry on with the next file.
    pub fn decode(bytes: &[u8]) -> Result<Array2<f32>, SliceSkipped> {
        let object = Self::parse(bytes)?;
        Self::decode_object(&object)
    }

    /// Parse a DICOM file, with or without its 128-byte preamble.
    ///
    /// Bytes carrying neither a preamble nor the `DICM` magic code are read
    /// as a bare implicit VR little endian dataset, provided they start with
    /// a plausible element header.
    pub fn parse(bytes: &[u8]) -> Result<DefaultDicomObject, SliceSkipped> {
        let body = if Self::has_preamble(bytes) {
            &bytes[PREAMBLE_LEN..]
        } else {
            bytes
        };
        if !body.starts_with(MAGIC) && Self::looks_like_dataset(body) {
            return Self::parse_dataset(body);
        }
        let object = OpenFileOptions::new()
            .read_preamble(ReadPreamble::Never)
            .from_reader(body)?;
        Ok(object)
    }

    fn parse_dataset(body: &[u8]) -> Result<DefaultDicomObject, SliceSkipped> {
        let dataset = InMemDicomObject::read_dataset_with_ts(
            body,
            &entries::IMPLICIT_VR_LITTLE_ENDIAN.erased(),
        )?;
        let object = dataset.with_meta(
            FileMetaTableBuilder::new().transfer_syntax(uids::IMPLICIT_VR_LITTLE_ENDIAN),
        )?;
        Ok(object)
    }

    pub fn decode_object(object: &DefaultDicomObject) -> Result<Array2<f32>, SliceSkipped> {
        if object.element(tags::PIXEL_DATA).is_err() {
            return Err(SliceSkipped::NoPixelData);
        }

        let pixel_data = object.decode_pixel_data()?;
        let rows = pixel_data.rows();
        let columns = pixel_data.columns();
        if rows == 0 || columns == 0 {
            return Err(SliceSkipped::EmptyImage { rows, columns });
        }

        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
        let samples = pixel_data.samples_per_pixel().max(1) as usize;
        let values = pixel_data.to_vec_frame_with_options::<f32>(0, &options)?;

        let (height, width) = (rows as usize, columns as usize);
        let first_sample: Vec<f32> = values
            .into_iter()
            .step_by(samples)
            .take(height * width)
            .collect();
        if first_sample.len() != height * width {
            return Err(SliceSkipped::EmptyImage { rows, columns });
        }

        Array2::from_shape_vec((height, width), first_sample)
            .map_err(|_| SliceSkipped::EmptyImage { rows, columns })
    }

    fn has_preamble(bytes: &[u8]) -> bool {
        bytes.len() >= PREAMBLE_LEN + MAGIC.len()
            && &bytes[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()] == MAGIC
    }

    /// An even (public) group and a first value that fits in the buffer.
    fn looks_like_dataset(bytes: &[u8]) -> bool {
        let Some(header) = bytes.get(..IMPLICIT_HEADER_LEN) else {
            return false;
        };
        let group = u16::from_le_bytes([header[0], header[1]]);
        let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        group % 2 == 0
            && group != 0
            && (length == UNDEFINED_LENGTH
                || length as usize <= bytes.len() - IMPLICIT_HEADER_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{SyntheticSlice, dataset_bytes, dicom_bytes};

    #[test]
    fn decodes_stored_values() {
        let slice = SyntheticSlice::ramp(4, 3);
        let grid = SliceDecoder::decode(&dicom_bytes(&slice)).unwrap();

        assert_eq!(grid.dim(), (4, 3));
        assert_eq!(grid[[0, 0]], 0.0);
        assert_eq!(grid[[3, 2]], 11.0);
    }

    #[test]
    fn keeps_signed_values() {
        let slice = SyntheticSlice::filled(2, 2, -1024);
        let grid = SliceDecoder::decode(&dicom_bytes(&slice)).unwrap();

        assert!(grid.iter().all(|&v| v == -1024.0));
    }

    #[test]
    fn accepts_files_without_preamble() {
        let slice = SyntheticSlice::filled(2, 5, 7);
        let bytes = dicom_bytes(&slice);
        let grid = SliceDecoder::decode(&bytes[PREAMBLE_LEN..]).unwrap();

        assert_eq!(grid.dim(), (2, 5));
    }

    #[test]
    fn reads_bare_datasets_without_file_meta() {
        let bytes = dataset_bytes(&SyntheticSlice::ramp(2, 2));
        assert!(!bytes.starts_with(MAGIC));

        let grid = SliceDecoder::decode(&bytes).unwrap();

        assert_eq!(grid, ndarray::array![[0.0_f32, 1.0], [2.0, 3.0]]);
    }

    #[test]
    fn bare_dataset_without_pixel_data_is_skipped() {
        let bytes = dataset_bytes(&SyntheticSlice::filled(2, 2, 1).without_pixel_data());
        let result = SliceDecoder::decode(&bytes);

        assert!(matches!(result, Err(SliceSkipped::NoPixelData)));
    }

    #[test]
    fn rejects_headers_declaring_more_bytes_than_present() {
        let mut bytes = vec![0x08, 0x00, 0x16, 0x00];
        bytes.extend_from_slice(&1_000_000_u32.to_le_bytes());
        bytes.extend_from_slice(b"1.2");

        assert!(!SliceDecoder::looks_like_dataset(&bytes));
        assert!(matches!(
            SliceDecoder::decode(&bytes),
            Err(SliceSkipped::Malformed(_))
        ));
    }

    #[test]
    fn skips_objects_without_pixel_data() {
        let slice = SyntheticSlice::filled(2, 2, 1).without_pixel_data();
        let result = SliceDecoder::decode(&dicom_bytes(&slice));

        assert!(matches!(result, Err(SliceSkipped::NoPixelData)));
    }

    #[test]
    fn skips_garbage() {
        let result = SliceDecoder::decode(b"definitely not a dicom file");

        assert!(matches!(result, Err(SliceSkipped::Malformed(_))));
    }

    #[test]
    fn leaves_input_untouched() {
        let bytes = dicom_bytes(&SyntheticSlice::ramp(3, 3));
        let before = bytes.clone();
        let _ = SliceDecoder::decode(&bytes);

        assert_eq!(bytes, before);
    }
}
