use std::io::{Cursor, Write};
use std::sync::Once;

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom::transfer_syntax::entries;
use dicom_dictionary_std::{tags, uids};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A monochrome, signed 16-bit slice built in memory.
pub struct SyntheticSlice {
    pub rows: u16,
    pub columns: u16,
    pub pixels: Vec<i16>,
    pub with_pixel_data: bool,
}

impl SyntheticSlice {
    /// Row-major pixels computed from `(row, column)`.
    pub fn from_fn(rows: u16, columns: u16, pixel: impl Fn(usize, usize) -> i16) -> Self {
        let pixels = (0..rows as usize)
            .flat_map(|r| (0..columns as usize).map(move |c| (r, c)))
            .map(|(r, c)| pixel(r, c))
            .collect();
        Self {
            rows,
            columns,
            pixels,
            with_pixel_data: true,
        }
    }

    pub fn filled(rows: u16, columns: u16, value: i16) -> Self {
        Self::from_fn(rows, columns, |_, _| value)
    }

    /// 0, 1, 2, ... so every pixel is distinct.
    pub fn ramp(rows: u16, columns: u16) -> Self {
        Self::from_fn(rows, columns, |r, c| (r * columns as usize + c) as i16)
    }

    pub fn without_pixel_data(mut self) -> Self {
        self.with_pixel_data = false;
        self
    }

    fn dataset(&self) -> InMemDicomObject {
        let mut object = InMemDicomObject::from_element_iter([
            DataElement::new(
                tags::SOP_CLASS_UID,
                VR::UI,
                PrimitiveValue::from(uids::CT_IMAGE_STORAGE),
            ),
            DataElement::new(tags::SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from("2.25.42")),
            DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
            DataElement::new(
                tags::PHOTOMETRIC_INTERPRETATION,
                VR::CS,
                PrimitiveValue::from("MONOCHROME2"),
            ),
            DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(self.rows)),
            DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(self.columns)),
            DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)),
            DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)),
            DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)),
            DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(1_u16)),
        ]);
        if self.with_pixel_data {
            let words: Vec<u16> = self.pixels.iter().map(|&v| v as u16).collect();
            object.put(DataElement::new(
                tags::PIXEL_DATA,
                VR::OW,
                PrimitiveValue::U16(words.into()),
            ));
        }
        object
    }
}

/// Complete DICOM file: preamble, `DICM` magic, file meta group and dataset.
pub fn dicom_bytes(slice: &SyntheticSlice) -> Vec<u8> {
    let file = slice
        .dataset()
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::CT_IMAGE_STORAGE)
                .media_storage_sop_instance_uid("2.25.42"),
        )
        .expect("valid file meta group");
    let mut bytes = Vec::new();
    file.write_all(&mut bytes).expect("in-memory DICOM write");
    bytes
}

/// Bare implicit VR little endian dataset with no preamble or file meta group.
pub fn dataset_bytes(slice: &SyntheticSlice) -> Vec<u8> {
    let mut bytes = Vec::new();
    slice
        .dataset()
        .write_dataset_with_ts(&mut bytes, &entries::IMPLICIT_VR_LITTLE_ENDIAN.erased())
        .expect("in-memory dataset write");
    bytes
}

/// Deflated ZIP archive; names ending in `/` become directory entries.
pub fn zip_bytes(members: &[(impl AsRef<str>, Vec<u8>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in members {
        let name = name.as_ref();
        if name.ends_with('/') {
            writer.add_directory(name, options).unwrap();
        } else {
            writer.start_file(name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}
