//! Synthetic managed images for the integration tests.
//!
//! [`ImageBuilder`] emits a complete PE32 image with a single `.text` section holding the CLI
//! header, the method bodies and the metadata. The metadata has the five heaps, and a tables
//! stream with Module, TypeRef, TypeDef, Field, MethodDef, Param and MemberRef rows.
#![allow(dead_code)]

use std::ops::Range;

use dotredact::metadata::streams::user_string_flag;

pub const TEXT_RVA: u32 = 0x2000;
pub const TEXT_OFFSET: usize = 0x200;
pub const CLI_HEADER_RVA: u32 = TEXT_RVA + 8;
pub const HELLO_WORLD: &str = "Hello, World!";

const FILE_ALIGNMENT: usize = 0x200;
const OPTIONAL_HEADER_OFFSET: usize = 0x98;
const SECTION_TABLE_OFFSET: usize = 0x178;

/// `call` MemberRef 1 (`Console.WriteLine`)
pub const CALL_WRITELINE: [u8; 5] = [0x28, 0x01, 0x00, 0x00, 0x0A];

/// A tiny method header followed by `code`
pub fn tiny(code: &[u8]) -> Vec<u8> {
    assert!(code.len() < 64);

    let mut body = vec![((code.len() as u8) << 2) | 0x02];
    body.extend_from_slice(code);
    body
}

/// A 12-byte fat method header followed by `code`
pub fn fat(code: &[u8], max_stack: u16, init_locals: bool) -> Vec<u8> {
    let flags: u16 = 0x3003 | if init_locals { 0x10 } else { 0 };

    let mut body = Vec::new();
    body.extend_from_slice(&flags.to_le_bytes());
    body.extend_from_slice(&max_stack.to_le_bytes());
    body.extend_from_slice(&(code.len() as u32).to_le_bytes());
    body.extend_from_slice(&0u32.to_le_bytes());
    body.extend_from_slice(code);
    body
}

/// `ldstr` of the `#US` entry at `offset`
pub fn ldstr(offset: u32) -> [u8; 5] {
    let token = 0x7000_0000 | offset;
    let bytes = token.to_le_bytes();
    [0x72, bytes[0], bytes[1], bytes[2], bytes[3]]
}

/// The code of `Main`: `nop; ldstr; call WriteLine; nop; ret`
pub fn hello_code(us_offset: u32) -> Vec<u8> {
    let mut code = vec![0x00];
    code.extend_from_slice(&ldstr(us_offset));
    code.extend_from_slice(&CALL_WRITELINE);
    code.extend_from_slice(&[0x00, 0x2A]);
    code
}

/// The code of the default constructor: `ldarg.0; call Object::.ctor; ret`
pub const CTOR_CODE: [u8; 7] = [0x02, 0x28, 0x02, 0x00, 0x00, 0x0A, 0x2A];

/// One MethodDef row
pub struct MethodSpec {
    pub name: String,
    pub body: Option<Vec<u8>>,
    pub rva: Option<u32>,
    pub impl_flags: u16,
}

/// Where the builder placed things
pub struct BuiltImage {
    pub data: Vec<u8>,
    /// RVA of each method, 0 for methods without body
    pub method_rvas: Vec<u32>,
    /// `#US` offset of each user string
    pub us_offsets: Vec<u32>,
    /// File range of the `#US` stream
    pub us_range: Range<usize>,
    /// File range of the `#~` stream
    pub tables_range: Range<usize>,
    /// File offset of the metadata root
    pub metadata_offset: usize,
}

impl BuiltImage {
    /// File range of the UTF-16 payload of user string `index`
    pub fn payload_range(&self, index: usize, value: &str) -> Range<usize> {
        let length = value.encode_utf16().count() * 2 + 1;
        let prefix = compressed_len(length as u32).len();
        let start = self.us_range.start + self.us_offsets[index] as usize + prefix;
        start..start + length - 1
    }
}

pub struct ImageBuilder {
    heap_sizes: u8,
    user_strings: Vec<String>,
    methods: Vec<MethodSpec>,
}

struct Heap {
    data: Vec<u8>,
}

impl Heap {
    fn new() -> Heap {
        Heap { data: vec![0] }
    }

    fn string(&mut self, value: &str) -> u32 {
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        offset
    }

    fn blob(&mut self, value: &[u8]) -> u32 {
        let offset = self.data.len() as u32;
        self.data.extend(compressed_len(value.len() as u32));
        self.data.extend_from_slice(value);
        offset
    }

    fn user_string(&mut self, value: &str) -> u32 {
        let offset = self.data.len() as u32;
        let units: Vec<u16> = value.encode_utf16().collect();

        self.data
            .extend(compressed_len((units.len() * 2 + 1) as u32));
        for unit in &units {
            self.data.extend_from_slice(&unit.to_le_bytes());
        }
        self.data.push(user_string_flag(&units));
        offset
    }
}

pub fn compressed_len(value: u32) -> Vec<u8> {
    if value < 0x80 {
        vec![value as u8]
    } else if value < 0x4000 {
        vec![0x80 | (value >> 8) as u8, value as u8]
    } else {
        (0xC000_0000 | value).to_be_bytes().to_vec()
    }
}

fn push_index(buffer: &mut Vec<u8>, value: u32, large: bool) {
    if large {
        buffer.extend_from_slice(&value.to_le_bytes());
    } else {
        buffer.extend_from_slice(&(value as u16).to_le_bytes());
    }
}

fn pad4(buffer: &mut Vec<u8>) {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
}

fn put(data: &mut [u8], offset: usize, bytes: &[u8]) {
    data[offset..offset + bytes.len()].copy_from_slice(bytes);
}

impl Default for ImageBuilder {
    fn default() -> Self {
        ImageBuilder::new(0x00)
    }
}

impl ImageBuilder {
    pub fn new(heap_sizes: u8) -> ImageBuilder {
        ImageBuilder {
            heap_sizes,
            user_strings: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn user_string(mut self, value: &str) -> Self {
        self.user_strings.push(value.to_string());
        self
    }

    pub fn method(mut self, name: &str, body: Vec<u8>) -> Self {
        self.methods.push(MethodSpec {
            name: name.to_string(),
            body: Some(body),
            rva: None,
            impl_flags: 0,
        });
        self
    }

    /// A native, unmanaged method whose RVA points at `code`
    pub fn native_method(mut self, name: &str, code: Vec<u8>) -> Self {
        self.methods.push(MethodSpec {
            name: name.to_string(),
            body: Some(code),
            rva: None,
            impl_flags: 0x0005,
        });
        self
    }

    pub fn abstract_method(mut self, name: &str) -> Self {
        self.methods.push(MethodSpec {
            name: name.to_string(),
            body: None,
            rva: None,
            impl_flags: 0,
        });
        self
    }

    /// A method whose RVA is set to `rva` instead of pointing at a body
    pub fn method_at(mut self, name: &str, rva: u32) -> Self {
        self.methods.push(MethodSpec {
            name: name.to_string(),
            body: None,
            rva: Some(rva),
            impl_flags: 0,
        });
        self
    }

    /// `#US` offset the user string `index` will be placed at
    pub fn us_offset(&self, index: usize) -> u32 {
        let mut heap = Heap::new();
        let mut offset = 0;
        for value in &self.user_strings[..=index] {
            offset = heap.user_string(value);
        }
        offset
    }

    pub fn build(&self) -> BuiltImage {
        let large_str = self.heap_sizes & 0x01 != 0;
        let large_guid = self.heap_sizes & 0x02 != 0;
        let large_blob = self.heap_sizes & 0x04 != 0;

        let mut strings = Heap::new();
        let mut blobs = Heap::new();
        let mut userstrings = Heap::new();

        let us_offsets: Vec<u32> = self
            .user_strings
            .iter()
            .map(|value| userstrings.user_string(value))
            .collect();

        // .text: 8 bytes of IAT, the CLI header, then method bodies
        let mut text = vec![0u8; 8 + 72];
        let mut method_rvas = Vec::new();
        for method in &self.methods {
            match (&method.body, method.rva) {
                (_, Some(rva)) => method_rvas.push(rva),
                (Some(body), None) => {
                    pad4(&mut text);
                    method_rvas.push(TEXT_RVA + text.len() as u32);
                    text.extend_from_slice(body);
                }
                (None, None) => method_rvas.push(0),
            }
        }
        pad4(&mut text);

        // Tables stream
        let valid: u64 = (1 << 0x00)
            | (1 << 0x01)
            | (1 << 0x02)
            | (1 << 0x04)
            | (1 << 0x06)
            | (1 << 0x08)
            | (1 << 0x0A);

        let mut tables = Vec::new();
        tables.extend_from_slice(&0u32.to_le_bytes());
        tables.extend_from_slice(&[2, 0, self.heap_sizes, 1]);
        tables.extend_from_slice(&valid.to_le_bytes());
        tables.extend_from_slice(&0u64.to_le_bytes());
        for count in [1u32, 2, 2, 1, self.methods.len() as u32, 1, 2] {
            tables.extend_from_slice(&count.to_le_bytes());
        }

        // Module
        tables.extend_from_slice(&0u16.to_le_bytes());
        push_index(&mut tables, strings.string("HelloWorld.exe"), large_str);
        push_index(&mut tables, 1, large_guid);
        push_index(&mut tables, 0, large_guid);
        push_index(&mut tables, 0, large_guid);

        // TypeRef, resolution scope Module 1
        for (name, namespace) in [("Object", "System"), ("Console", "System")] {
            tables.extend_from_slice(&4u16.to_le_bytes());
            push_index(&mut tables, strings.string(name), large_str);
            push_index(&mut tables, strings.string(namespace), large_str);
        }

        // TypeDef
        let empty = strings.string("");
        tables.extend_from_slice(&0u32.to_le_bytes());
        push_index(&mut tables, strings.string("<Module>"), large_str);
        push_index(&mut tables, empty, large_str);
        tables.extend_from_slice(&[0, 0, 1, 0, 1, 0]);

        tables.extend_from_slice(&0x0010_0001u32.to_le_bytes());
        push_index(&mut tables, strings.string("Program"), large_str);
        push_index(&mut tables, strings.string("HelloWorld"), large_str);
        tables.extend_from_slice(&[5, 0, 1, 0, 1, 0]);

        // Field
        tables.extend_from_slice(&0x0011u16.to_le_bytes());
        push_index(&mut tables, strings.string("counter"), large_str);
        push_index(&mut tables, blobs.blob(&[0x06, 0x08]), large_blob);

        // MethodDef
        let main_signature = blobs.blob(&[0x00, 0x01, 0x01, 0x1D, 0x0E]);
        for (index, (method, rva)) in self.methods.iter().zip(&method_rvas).enumerate() {
            let flags: u16 = if method.body.is_none() && method.rva.is_none() {
                0x05C6
            } else {
                0x0096
            };
            tables.extend_from_slice(&rva.to_le_bytes());
            tables.extend_from_slice(&method.impl_flags.to_le_bytes());
            tables.extend_from_slice(&flags.to_le_bytes());
            push_index(&mut tables, strings.string(&method.name), large_str);
            push_index(&mut tables, main_signature, large_blob);
            tables.extend_from_slice(&(if index == 0 { 1u16 } else { 2 }).to_le_bytes());
        }

        // Param
        tables.extend_from_slice(&[0, 0, 1, 0]);
        push_index(&mut tables, strings.string("args"), large_str);

        // MemberRef, parents TypeRef 2 and TypeRef 1
        let writeline = blobs.blob(&[0x00, 0x01, 0x01, 0x0E]);
        let ctor = blobs.blob(&[0x20, 0x00, 0x01]);
        for (parent, name, signature) in [(17u16, "WriteLine", writeline), (9, ".ctor", ctor)] {
            tables.extend_from_slice(&parent.to_le_bytes());
            push_index(&mut tables, strings.string(name), large_str);
            push_index(&mut tables, signature, large_blob);
        }
        pad4(&mut tables);

        let mut guids = vec![
            0x9E, 0x44, 0x0A, 0x26, 0x37, 0x4C, 0x47, 0x4D, 0xB1, 0xA0, 0x2D, 0x3E, 0x5C, 0x60,
            0x71, 0x82,
        ];
        if large_guid {
            guids.extend_from_slice(&[0u8; 16]);
        }

        let mut strings = strings.data;
        let mut userstrings = userstrings.data;
        let mut blobs = blobs.data;
        pad4(&mut strings);
        pad4(&mut userstrings);
        pad4(&mut blobs);

        // Metadata root
        let streams: [(&str, &[u8]); 5] = [
            ("#~", &tables),
            ("#Strings", &strings),
            ("#US", &userstrings),
            ("#GUID", &guids),
            ("#Blob", &blobs),
        ];

        let mut root = Vec::new();
        root.extend_from_slice(&0x424A_5342u32.to_le_bytes());
        root.extend_from_slice(&[1, 0, 1, 0, 0, 0, 0, 0]);
        root.extend_from_slice(&12u32.to_le_bytes());
        root.extend_from_slice(b"v4.0.30319\0\0");
        root.extend_from_slice(&[0, 0]);
        root.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        let headers_len: usize = streams
            .iter()
            .map(|(name, _)| 8 + (name.len() + 1).div_ceil(4) * 4)
            .sum();
        let mut stream_offset = root.len() + headers_len;
        let mut stream_offsets = Vec::new();
        for (name, data) in &streams {
            stream_offsets.push(stream_offset);
            root.extend_from_slice(&(stream_offset as u32).to_le_bytes());
            root.extend_from_slice(&(data.len() as u32).to_le_bytes());
            root.extend_from_slice(name.as_bytes());
            root.push(0);
            pad4(&mut root);
            stream_offset += data.len();
        }
        for (_, data) in &streams {
            root.extend_from_slice(data);
        }

        let metadata_offset = text.len();
        text.extend_from_slice(&root);

        // CLI header
        let metadata_rva = TEXT_RVA + metadata_offset as u32;
        let entry_point = if self.methods.is_empty() { 0u32 } else { 0x0600_0001 };
        let mut cli = Vec::new();
        cli.extend_from_slice(&72u32.to_le_bytes());
        cli.extend_from_slice(&[2, 0, 5, 0]);
        cli.extend_from_slice(&metadata_rva.to_le_bytes());
        cli.extend_from_slice(&(root.len() as u32).to_le_bytes());
        cli.extend_from_slice(&1u32.to_le_bytes());
        cli.extend_from_slice(&entry_point.to_le_bytes());
        put(&mut text, 8, &cli);

        // PE headers
        let raw_size = text.len().div_ceil(FILE_ALIGNMENT) * FILE_ALIGNMENT;
        let mut data = vec![0u8; TEXT_OFFSET + raw_size];
        put(&mut data, 0, b"MZ");
        put(&mut data, 60, &0x80u32.to_le_bytes());
        put(&mut data, 0x80, b"PE\0\0");

        put(&mut data, 0x84, &0x14Cu16.to_le_bytes());
        put(&mut data, 0x86, &1u16.to_le_bytes());
        put(&mut data, 0x94, &0xE0u16.to_le_bytes());
        put(&mut data, 0x96, &0x0102u16.to_le_bytes());

        let optional = OPTIONAL_HEADER_OFFSET;
        put(&mut data, optional, &0x10Bu16.to_le_bytes());
        put(&mut data, optional + 16, &0u32.to_le_bytes());
        put(&mut data, optional + 28, &0x0040_0000u32.to_le_bytes());
        put(&mut data, optional + 32, &0x2000u32.to_le_bytes());
        put(&mut data, optional + 36, &(FILE_ALIGNMENT as u32).to_le_bytes());
        put(&mut data, optional + 92, &16u32.to_le_bytes());
        put(&mut data, optional + 208, &CLI_HEADER_RVA.to_le_bytes());
        put(&mut data, optional + 212, &72u32.to_le_bytes());

        let section = SECTION_TABLE_OFFSET;
        put(&mut data, section, b".text");
        put(&mut data, section + 8, &(text.len() as u32).to_le_bytes());
        put(&mut data, section + 12, &TEXT_RVA.to_le_bytes());
        put(&mut data, section + 16, &(raw_size as u32).to_le_bytes());
        put(&mut data, section + 20, &(TEXT_OFFSET as u32).to_le_bytes());
        put(&mut data, section + 36, &0x6000_0020u32.to_le_bytes());

        put(&mut data, TEXT_OFFSET, &text);

        let metadata_file_offset = TEXT_OFFSET + metadata_offset;
        let stream_range = |index: usize| {
            let start = metadata_file_offset + stream_offsets[index];
            start..start + streams[index].1.len()
        };

        BuiltImage {
            method_rvas,
            us_offsets,
            us_range: stream_range(2),
            tables_range: stream_range(0),
            metadata_offset: metadata_file_offset,
            data,
        }
    }
}

/// The hello-world assembly: `Main` prints one string, `.ctor` calls the base constructor
pub fn hello_world(heap_sizes: u8) -> BuiltImage {
    let builder = ImageBuilder::new(heap_sizes).user_string(HELLO_WORLD);
    let offset = builder.us_offset(0);

    builder
        .method("Main", tiny(&hello_code(offset)))
        .method(".ctor", tiny(&CTOR_CODE))
        .build()
}
