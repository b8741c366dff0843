#![allow(dead_code)]

//! In-memory engine and sinks shared by the integration tests.

use std::cell::{Cell, RefCell};
use std::io::Cursor;
use std::rc::Rc;
use std::sync::Mutex;

use zenheif::engine::{ColorPrimaries, TransferCharacteristics};
use zenheif::{
    Chroma, ColorProfileType, DecodedImage, DecodingOptions, Engine, EngineContext, EngineError,
    EngineReader, FormatId, GrowStatus, ImageHandle, ItemId, MessageSink, NclxProfile,
    ProgressSink, ProgressStep, Registration,
};

pub const HEIF_ID: FormatId = FormatId(40);
pub const AVIF_ID: FormatId = FormatId(41);
pub const REGISTRATION: Registration = Registration {
    heif: HEIF_ID,
    avif: AVIF_ID,
};

/// Bytes of junk after every source row.
pub const STRIDE_PADDING: usize = 3;

/// A minimal container: an `ftyp` box with `brand`, followed by filler.
pub fn container(brand: &[u8; 4]) -> Cursor<Vec<u8>> {
    let mut data = vec![0, 0, 0, 0x18];
    data.extend_from_slice(b"ftyp");
    data.extend_from_slice(brand);
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(b"mif1heic");
    data.extend_from_slice(&[0u8; 16]);
    Cursor::new(data)
}

pub fn heic() -> Cursor<Vec<u8>> {
    container(b"heic")
}

pub fn avif() -> Cursor<Vec<u8>> {
    container(b"avif")
}

/// Test pattern for the pixel at column `x`, row `y` (row 0 on top).
pub fn pattern(x: u32, y: u32) -> [u8; 4] {
    [
        x as u8,
        y as u8,
        (x * 3 + y * 7) as u8,
        (128 + x) as u8,
    ]
}

#[derive(Clone, Debug)]
pub enum MockProfile {
    None,
    Icc(Vec<u8>),
    Nclx(NclxProfile),
    /// Claims an ICC profile but fails to hand it out.
    BrokenIcc,
}

#[derive(Clone, Debug)]
pub struct MockBlock {
    pub kind: &'static str,
    pub content_type: &'static str,
    pub data: Result<Vec<u8>, String>,
}

impl MockBlock {
    pub fn exif(data: Vec<u8>) -> Self {
        Self {
            kind: "Exif",
            content_type: "",
            data: Ok(data),
        }
    }

    pub fn xmp(packet: &str) -> Self {
        Self {
            kind: "mime",
            content_type: "application/rdf+xml",
            data: Ok(packet.as_bytes().to_vec()),
        }
    }
}

/// Everything the mock reports about one image.
#[derive(Clone, Debug)]
pub struct MockImage {
    /// Dimensions after transformations.
    pub width: u32,
    pub height: u32,
    /// Dimensions as coded, before transformations.
    pub ispe_width: u32,
    pub ispe_height: u32,
    pub has_alpha: bool,
    pub luma_bits: u8,
    pub chroma_bits: u8,
    pub profile: MockProfile,
    pub metadata: Vec<MockBlock>,
    pub thumbnails: Vec<MockImage>,
    pub decode_error: Option<String>,
    pub tiles: u32,
    pub panic_on_decode: bool,
}

impl MockImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ispe_width: width,
            ispe_height: height,
            has_alpha: false,
            luma_bits: 8,
            chroma_bits: 8,
            profile: MockProfile::None,
            metadata: Vec::new(),
            thumbnails: Vec::new(),
            decode_error: None,
            tiles: 4,
            panic_on_decode: false,
        }
    }

    pub fn rotated(mut self) -> Self {
        std::mem::swap(&mut self.ispe_width, &mut self.ispe_height);
        self
    }

    pub fn with_alpha(mut self) -> Self {
        self.has_alpha = true;
        self
    }

    pub fn with_bit_depth(mut self, bits: u8) -> Self {
        self.luma_bits = bits;
        self.chroma_bits = bits;
        self
    }

    pub fn with_profile(mut self, profile: MockProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_metadata(mut self, block: MockBlock) -> Self {
        self.metadata.push(block);
        self
    }

    pub fn with_thumbnail(mut self, thumb: MockImage) -> Self {
        self.thumbnails.push(thumb);
        self
    }

    pub fn failing_decode(mut self, message: &str) -> Self {
        self.decode_error = Some(message.to_owned());
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_decode = true;
        self
    }
}

/// Options observed by one `decode` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeenDecode {
    pub chroma: Chroma,
    pub max_threads: u32,
    pub convert_hdr_to_8bit: bool,
    pub ignore_transformations: bool,
    pub with_progress: bool,
}

#[derive(Default)]
pub struct Shared {
    /// Contexts and handles currently alive.
    pub live: Cell<i32>,
    pub decodes: RefCell<Vec<SeenDecode>>,
}

pub struct MockEngine {
    image: Rc<MockImage>,
    pub shared: Rc<Shared>,
}

impl MockEngine {
    pub fn new(image: MockImage) -> Self {
        Self {
            image: Rc::new(image),
            shared: Rc::default(),
        }
    }

    pub fn live(&self) -> i32 {
        self.shared.live.get()
    }

    pub fn decodes(&self) -> Vec<SeenDecode> {
        self.shared.decodes.borrow().clone()
    }
}

impl Engine for MockEngine {
    type Context<'r>
        = MockContext<'r>
    where
        Self: 'r;

    fn read_from_reader<'r>(
        &'r self,
        reader: &'r mut dyn EngineReader,
    ) -> Result<MockContext<'r>, EngineError> {
        if reader.wait_for_file_size(12) != GrowStatus::SizeReached {
            return Err(EngineError::new("Invalid input: No ftyp box"));
        }
        reader
            .seek(0)
            .map_err(|e| EngineError::new(e.to_string()))?;
        let mut header = [0u8; 12];
        reader
            .read(&mut header)
            .map_err(|e| EngineError::new(e.to_string()))?;
        if &header[4..8] != b"ftyp" {
            return Err(EngineError::new("Invalid input: No ftyp box"));
        }
        self.shared.live.set(self.shared.live.get() + 1);
        Ok(MockContext {
            engine: self,
            _reader: reader,
        })
    }
}

pub struct MockContext<'r> {
    engine: &'r MockEngine,
    _reader: &'r mut dyn EngineReader,
}

impl Drop for MockContext<'_> {
    fn drop(&mut self) {
        let live = &self.engine.shared.live;
        live.set(live.get() - 1);
    }
}

impl EngineContext for MockContext<'_> {
    type Handle = MockHandle;

    fn primary_image_handle(&self) -> Result<MockHandle, EngineError> {
        Ok(MockHandle::new(
            Rc::clone(&self.engine.image),
            Rc::clone(&self.engine.shared),
        ))
    }
}

pub struct MockHandle {
    image: Rc<MockImage>,
    shared: Rc<Shared>,
}

impl MockHandle {
    fn new(image: Rc<MockImage>, shared: Rc<Shared>) -> Self {
        shared.live.set(shared.live.get() + 1);
        Self { image, shared }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.shared.live.set(self.shared.live.get() - 1);
    }
}

fn block(image: &MockImage, id: ItemId) -> Option<&MockBlock> {
    image.metadata.get(id as usize)
}

impl ImageHandle for MockHandle {
    fn has_alpha_channel(&self) -> bool {
        self.image.has_alpha
    }

    fn luma_bits_per_pixel(&self) -> u8 {
        self.image.luma_bits
    }

    fn chroma_bits_per_pixel(&self) -> u8 {
        self.image.chroma_bits
    }

    fn width(&self) -> u32 {
        self.image.width
    }

    fn height(&self) -> u32 {
        self.image.height
    }

    fn ispe_width(&self) -> u32 {
        self.image.ispe_width
    }

    fn ispe_height(&self) -> u32 {
        self.image.ispe_height
    }

    fn decode(
        &self,
        chroma: Chroma,
        options: &DecodingOptions<'_>,
    ) -> Result<DecodedImage, EngineError> {
        self.shared.decodes.borrow_mut().push(SeenDecode {
            chroma,
            max_threads: options.max_threads,
            convert_hdr_to_8bit: options.convert_hdr_to_8bit,
            ignore_transformations: options.ignore_transformations,
            with_progress: options.progress.is_some(),
        });
        if self.image.panic_on_decode {
            panic!("tile table corrupt");
        }
        if let Some(progress) = options.progress {
            progress.start(ProgressStep::Total, 1);
            progress.on_progress(ProgressStep::Total, 1);
            progress.start(ProgressStep::LoadTile, self.image.tiles);
            for tile in 1..=self.image.tiles {
                if !progress.on_progress(ProgressStep::LoadTile, tile) {
                    return Err(EngineError::new("Decoding was cancelled"));
                }
            }
        }
        if let Some(message) = &self.image.decode_error {
            return Err(EngineError::new(message.clone()));
        }

        let (width, height) = if options.ignore_transformations {
            (self.image.ispe_width, self.image.ispe_height)
        } else {
            (self.image.width, self.image.height)
        };
        let bpp = if chroma.has_alpha() { 4 } else { 3 };
        let stride = width as usize * bpp + STRIDE_PADDING;
        let mut data = Vec::with_capacity(stride * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&pattern(x, y)[..bpp]);
            }
            data.extend_from_slice(&[0xEE; STRIDE_PADDING]);
        }
        Ok(DecodedImage {
            width,
            height,
            stride,
            bits_per_pixel: bpp as u32 * 8,
            data,
        })
    }

    fn color_profile_type(&self) -> ColorProfileType {
        match self.image.profile {
            MockProfile::None => ColorProfileType::NotPresent,
            MockProfile::Icc(_) | MockProfile::BrokenIcc => ColorProfileType::Icc,
            MockProfile::Nclx(_) => ColorProfileType::Nclx,
        }
    }

    fn raw_color_profile(&self) -> Result<Vec<u8>, EngineError> {
        match &self.image.profile {
            MockProfile::Icc(bytes) => Ok(bytes.clone()),
            _ => Err(EngineError::new("Color profile does not exist")),
        }
    }

    fn nclx_color_profile(&self) -> Result<NclxProfile, EngineError> {
        match &self.image.profile {
            MockProfile::Nclx(nclx) => Ok(*nclx),
            _ => Err(EngineError::new("Color profile does not exist")),
        }
    }

    fn metadata_block_ids(&self, type_filter: Option<&str>) -> Vec<ItemId> {
        self.image
            .metadata
            .iter()
            .enumerate()
            .filter(|(_, b)| type_filter.is_none_or(|t| t == b.kind))
            .map(|(i, _)| i as ItemId)
            .collect()
    }

    fn metadata_type(&self, id: ItemId) -> String {
        block(&self.image, id).map_or_else(String::new, |b| b.kind.to_owned())
    }

    fn metadata_content_type(&self, id: ItemId) -> String {
        block(&self.image, id).map_or_else(String::new, |b| b.content_type.to_owned())
    }

    fn metadata(&self, id: ItemId) -> Result<Vec<u8>, EngineError> {
        match block(&self.image, id).map(|b| &b.data) {
            Some(Ok(data)) => Ok(data.clone()),
            Some(Err(message)) => Err(EngineError::new(message.clone())),
            None => Err(EngineError::new("Metadata not found")),
        }
    }

    fn thumbnail_ids(&self) -> Vec<ItemId> {
        (0..self.image.thumbnails.len() as ItemId).collect()
    }

    fn thumbnail(&self, id: ItemId) -> Result<MockHandle, EngineError> {
        let thumb = self
            .image
            .thumbnails
            .get(id as usize)
            .ok_or_else(|| EngineError::new("Thumbnail not found"))?;
        Ok(MockHandle::new(
            Rc::new(thumb.clone()),
            Rc::clone(&self.shared),
        ))
    }
}

/// NCLX description with BT.709 chromaticities and the given codes.
pub fn nclx(primaries: ColorPrimaries, transfer: TransferCharacteristics) -> NclxProfile {
    use zenheif::engine::Chromaticity;
    NclxProfile {
        color_primaries: primaries,
        transfer_characteristics: transfer,
        red: Chromaticity { x: 0.64, y: 0.33 },
        green: Chromaticity { x: 0.30, y: 0.60 },
        blue: Chromaticity { x: 0.15, y: 0.06 },
        white: Chromaticity {
            x: 0.3127,
            y: 0.3290,
        },
    }
}

/// Records every message with its format tag.
#[derive(Default)]
pub struct Collect {
    pub messages: RefCell<Vec<(FormatId, String)>>,
}

impl Collect {
    pub fn texts(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn formats(&self) -> Vec<FormatId> {
        self.messages.borrow().iter().map(|(id, _)| *id).collect()
    }
}

impl MessageSink for Collect {
    fn message(&self, format: FormatId, text: &str) {
        self.messages.borrow_mut().push((format, text.to_owned()));
    }
}

/// Records every reported fraction; cancels once `cancel_above` is exceeded.
pub struct Recorder {
    pub fractions: Mutex<Vec<f64>>,
    cancel_above: f64,
}

impl Recorder {
    pub fn new() -> Self {
        Self::cancelling_above(f64::INFINITY)
    }

    pub fn cancelling_above(cancel_above: f64) -> Self {
        Self {
            fractions: Mutex::new(Vec::new()),
            cancel_above,
        }
    }

    pub fn seen(&self) -> Vec<f64> {
        self.fractions.lock().unwrap().clone()
    }
}

impl ProgressSink for Recorder {
    fn report(&self, fraction: f64) -> bool {
        self.fractions.lock().unwrap().push(fraction);
        fraction <= self.cancel_above
    }
}
