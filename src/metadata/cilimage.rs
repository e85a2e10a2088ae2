//! A loaded managed image: the PE file plus its decoded CLI metadata.
//!
//! [`CilImage`] runs the structural part of the pipeline once, at load time:
//!
//! 1. PE/COFF headers and section table ([`crate::File`])
//! 2. CLI header through the CLR runtime header directory
//! 3. Metadata root and stream headers, with every stream resolved to a file offset
//! 4. The `#~` tables stream, and a validity check of each heap
//!
//! Any failure in these steps aborts the load. Method bodies are located on request through
//! [`CilImage::method_bodies`], where failures are collected per method instead.

use std::{ops::Range, path::Path};

use crate::{
    file::File,
    metadata::{
        cor20header::{Cor20Header, COR20_HEADER_SIZE},
        method::{locate_bodies, MethodBodies},
        root::Root,
        streams::{Blob, Guid, StreamHeader, Strings, TablesHeader, UserStrings},
    },
    Error, Result,
};

/// A parsed .NET image
pub struct CilImage {
    file: File,
    cor20header: Cor20Header,
    root: Root,
    tables: TablesHeader,
}

impl CilImage {
    /// Memory-map and parse the image at `path`
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped, and any
    /// structural error of the image
    pub fn from_file(path: &Path) -> Result<CilImage> {
        Self::load(File::from_file(path)?)
    }

    /// Parse an image held in memory
    ///
    /// # Errors
    /// Returns any structural error of the image
    pub fn from_mem(data: Vec<u8>) -> Result<CilImage> {
        Self::load(File::from_mem(data)?)
    }

    fn load(file: File) -> Result<CilImage> {
        let Some(clr) = file.clr() else {
            return Err(Error::NotSupported);
        };

        let cor20header =
            Cor20Header::read(file.rva_slice(clr.virtual_address, COR20_HEADER_SIZE)?)?;

        let metadata = file.rva_slice(
            cor20header.meta_data_rva,
            cor20header.meta_data_size as usize,
        )?;
        let mut root = Root::read(metadata)?;
        root.resolve_streams(cor20header.meta_data_rva, |rva| file.rva_to_offset(rva))?;

        for stream in &root.stream_headers {
            log::debug!(
                "Stream {} at file offset {:#x}, {} bytes",
                stream.name,
                stream.file_offset,
                stream.size
            );
        }

        let tables_stream = root.tables_stream()?;
        let tables = TablesHeader::from(
            file.data_slice(tables_stream.file_offset, tables_stream.size as usize)?,
        )?;

        let image = CilImage {
            file,
            cor20header,
            root,
            tables,
        };
        image.validate_heaps()?;

        Ok(image)
    }

    fn validate_heaps(&self) -> Result<()> {
        if let Some(data) = self.stream_data("#Strings")? {
            Strings::from(data)?;
        }
        if let Some(data) = self.stream_data("#US")? {
            UserStrings::from(data)?;
        }
        if let Some(data) = self.stream_data("#GUID")? {
            Guid::from(data)?;
        }
        if let Some(data) = self.stream_data("#Blob")? {
            Blob::from(data)?;
        }

        Ok(())
    }

    /// The underlying PE file
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// All bytes of the image
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.file.data()
    }

    /// The CLI header
    #[must_use]
    pub fn cor20header(&self) -> &Cor20Header {
        &self.cor20header
    }

    /// The metadata root
    #[must_use]
    pub fn metadata_root(&self) -> &Root {
        &self.root
    }

    /// The stream headers, with resolved file offsets
    #[must_use]
    pub fn streams(&self) -> &[StreamHeader] {
        &self.root.stream_headers
    }

    /// The decoded tables stream
    #[must_use]
    pub fn tables(&self) -> &TablesHeader {
        &self.tables
    }

    /// Image range occupied by the stream `name`
    #[must_use]
    pub fn stream_range(&self, name: &str) -> Option<Range<usize>> {
        self.root
            .stream(name)
            .map(|stream| stream.file_offset..stream.file_offset + stream.size as usize)
    }

    fn stream_data(&self, name: &str) -> Result<Option<&[u8]>> {
        match self.root.stream(name) {
            Some(stream) => Ok(Some(
                self.file
                    .data_slice(stream.file_offset, stream.size as usize)?,
            )),
            None => Ok(None),
        }
    }

    /// The `#Strings` heap, if present
    #[must_use]
    pub fn strings(&self) -> Option<Strings<'_>> {
        self.stream_data("#Strings")
            .ok()
            .flatten()
            .and_then(|data| Strings::from(data).ok())
    }

    /// The `#US` heap, if present
    #[must_use]
    pub fn userstrings(&self) -> Option<UserStrings<'_>> {
        self.stream_data("#US")
            .ok()
            .flatten()
            .and_then(|data| UserStrings::from(data).ok())
    }

    /// The `#GUID` heap, if present
    #[must_use]
    pub fn guids(&self) -> Option<Guid<'_>> {
        self.stream_data("#GUID")
            .ok()
            .flatten()
            .and_then(|data| Guid::from(data).ok())
    }

    /// The `#Blob` heap, if present
    #[must_use]
    pub fn blobs(&self) -> Option<Blob<'_>> {
        self.stream_data("#Blob")
            .ok()
            .flatten()
            .and_then(|data| Blob::from(data).ok())
    }

    /// Name of the module, from the single Module row
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the Module row or the `#Strings` heap is missing,
    /// and any error resolving the name
    pub fn module_name(&self) -> Result<&str> {
        let module = self
            .tables
            .module
            .get(1)
            .ok_or_else(|| malformed_error!("Image has no Module row"))?;
        let strings = self
            .strings()
            .ok_or_else(|| malformed_error!("Image has no #Strings heap"))?;

        module.name(&strings)
    }

    /// Module version id, from the single Module row
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the Module row or the `#GUID` heap is missing,
    /// and any error resolving the index
    pub fn mvid(&self) -> Result<uguid::Guid> {
        let module = self
            .tables
            .module
            .get(1)
            .ok_or_else(|| malformed_error!("Image has no Module row"))?;
        let guids = self
            .guids()
            .ok_or_else(|| malformed_error!("Image has no #GUID heap"))?;

        module.mvid(&guids)
    }

    /// Locate the body of every method in the MethodDef table
    #[must_use]
    pub fn method_bodies(&self) -> MethodBodies {
        locate_bodies(&self.file, &self.tables.method_def)
    }
}

impl std::fmt::Debug for CilImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CilImage")
            .field("file", &self.file)
            .field("version", &self.root.version)
            .field("streams", &self.root.stream_headers.len())
            .field("tables", &self.tables.table_count())
            .finish()
    }
}
