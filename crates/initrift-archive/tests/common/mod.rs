//! Minimal newc record walker used to check layout invariants.

#![allow(dead_code)]

pub const HEADER_LEN: usize = 110;

#[derive(Debug, Clone)]
pub struct Record {
    /// Offset of the magic
    pub offset: usize,
    /// Offset of the first content byte
    pub data_offset: usize,
    pub fields: [u32; 13],
    pub name: String,
    pub data: Vec<u8>,
}

impl Record {
    pub fn ino(&self) -> u32 {
        self.fields[0]
    }

    pub fn mode(&self) -> u32 {
        self.fields[1]
    }

    pub fn uid(&self) -> u32 {
        self.fields[2]
    }

    pub fn gid(&self) -> u32 {
        self.fields[3]
    }

    pub fn nlink(&self) -> u32 {
        self.fields[4]
    }

    pub fn mtime(&self) -> u32 {
        self.fields[5]
    }

    pub fn size(&self) -> u32 {
        self.fields[6]
    }

    pub fn namesize(&self) -> u32 {
        self.fields[11]
    }
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

fn assert_zeros(archive: &[u8], from: usize, to: usize) {
    assert!(
        archive[from..to].iter().all(|&b| b == 0),
        "non-NUL padding at {from}..{to}"
    );
}

/// Walk every record up to and including the trailer.
///
/// Panics on any framing violation, including bytes after the trailer.
pub fn parse(archive: &[u8]) -> Vec<Record> {
    let mut records = Vec::new();
    let mut pos = 0;

    loop {
        assert_eq!(&archive[pos..pos + 6], b"070701", "bad magic at {pos}");

        let mut fields = [0u32; 13];
        for (i, field) in fields.iter_mut().enumerate() {
            let start = pos + 6 + i * 8;
            let hex = std::str::from_utf8(&archive[start..start + 8]).unwrap();
            assert_eq!(hex, hex.to_lowercase(), "uppercase hex at {start}");
            *field = u32::from_str_radix(hex, 16).unwrap();
        }

        let namesize = fields[11] as usize;
        let name_start = pos + HEADER_LEN;
        let name_end = name_start + namesize;
        assert_eq!(archive[name_end - 1], 0, "name not NUL terminated at {pos}");
        let name = std::str::from_utf8(&archive[name_start..name_end - 1])
            .unwrap()
            .to_string();

        let data_offset = align4(name_end);
        assert_zeros(archive, name_end, data_offset);

        let size = fields[6] as usize;
        let data_end = data_offset + size;
        let next = align4(data_end);
        assert_zeros(archive, data_end, next);

        let is_trailer = name == "TRAILER!!!";
        records.push(Record {
            offset: pos,
            data_offset,
            fields,
            name,
            data: archive[data_offset..data_end].to_vec(),
        });

        if is_trailer {
            assert_eq!(next, archive.len(), "bytes after trailer");
            break;
        }
        pos = next;
    }

    records
}
