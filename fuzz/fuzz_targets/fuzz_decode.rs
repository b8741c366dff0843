#![no_main]
use libfuzzer_sys::fuzz_target;

use zenheif::{EngineReader, FlagLayout, LoadFlags, ReaderAdapter};

fuzz_target!(|data: &[u8]| {
    // Brand sniffing and EXIF framing see untrusted bytes and must never panic
    let _ = zenheif::sniff(data);
    let _ = zenheif::metadata::correct_exif(data);

    if let Some((word, _)) = data.split_first_chunk::<4>() {
        let word = u32::from_le_bytes(*word);
        for bits in 1..=12 {
            if let Ok(layout) = FlagLayout::new(bits) {
                let flags = LoadFlags::parse(word, layout);
                assert!(flags.decode.thread_limit <= layout.max_thread_limit());
            }
        }
    }

    // Reads past the end must fail cleanly
    let mut cursor = std::io::Cursor::new(data);
    if let Ok(mut reader) = ReaderAdapter::new(&mut cursor) {
        let len = reader.len();
        let _ = reader.wait_for_file_size(len.saturating_add(1));
        let mut buf = [0u8; 16];
        let _ = reader.seek(len / 2);
        let _ = reader.read(&mut buf);
    }
});
