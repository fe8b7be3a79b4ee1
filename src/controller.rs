//! Serialization controller: stream lifecycle and listener orchestration
//!
//! A [`StateSerializer`] drives a [`StateRegistry`] of listeners through the
//! default / read / write phases. The phase machine is expressed through
//! handle ownership: a [`SettingsReader`] or [`SettingsWriter`] existing is
//! the stream-open state, and `close_write` consuming the writer is the
//! transition to closed. All activity runs synchronously on the caller's
//! thread; concurrent cycles must be serialized by the caller.

use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::allowlist::TypeAllowList;
use crate::codec::CodecRegistry;
use crate::constants::{config, format};
use crate::document::{self, Node, read_document};
use crate::records::{Record, decode_node_value, decode_record, encode_record};
use crate::value::Value;

/// One slice of application state that knows how to default, read and write
/// itself
///
/// Listeners receive the open handle by reference for the duration of their
/// own callback only and must not retain it. Success is communicated by
/// returning `Ok`.
pub trait StateListener {
    /// Populate in-memory defaults; the fallback path when reading fails
    fn on_set_default_state(&mut self);

    /// Read this listener's named records from the open document
    fn on_read_state(&mut self, input: &SettingsReader) -> Result<()>;

    /// Write this listener's named records into the open document
    fn on_write_state(&mut self, output: &mut SettingsWriter) -> Result<()>;
}

/// Append-only listener registry, owned by the application's composition
/// root and passed by reference to the serializer
///
/// There is deliberately no removal operation: once added, a listener
/// participates in every future load/save cycle for the registry's lifetime.
/// Tests construct isolated registries; teardown is ordinary drop.
#[derive(Default)]
pub struct StateRegistry {
    listeners: Vec<Box<dyn StateListener>>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: impl StateListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Caller-tunable knobs for a serializer
#[derive(Debug, Clone, Default)]
pub struct SerializerOptions {
    extra_allowed: Vec<String>,
}

impl SerializerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable an additional allow-list pattern (exact qualified id or
    /// `prefix*` glob) for decoding
    pub fn allow_types(mut self, pattern: impl Into<String>) -> Self {
        self.extra_allowed.push(pattern.into());
        self
    }
}

/// Open write handle: an output file with framing already written, plus the
/// document body being accumulated
pub struct SettingsWriter {
    file: File,
    root: Node,
    registry: CodecRegistry,
}

impl SettingsWriter {
    /// Append one named record; a duplicate name within the same cycle
    /// replaces the earlier record (last write wins)
    pub fn put(&mut self, name: &str, source: &str, value: &Value) -> Result<()> {
        let record = Record::new(name, source, value.clone());
        let node = encode_record(&record, &self.registry)
            .with_context(|| format!("Failed to encode record '{name}'"))?;
        if self
            .root
            .remove_child_where(|c| c.attr(format::NAME_ATTR) == Some(name))
            .is_some()
        {
            warn!(name = %name, "replacing record already written in this cycle");
        }
        self.root.push_child(node);
        Ok(())
    }
}

/// Open read handle: a parsed document plus the codecs and allow-list
/// installed for this stream
pub struct SettingsReader {
    root: Node,
    registry: CodecRegistry,
    allow: TypeAllowList,
}

impl SettingsReader {
    /// Decode one named record; `None` when no record of that name exists
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        let node = self.root.children().iter().find(|c| {
            c.name == format::RECORD_NODE && c.attr(format::NAME_ATTR) == Some(name)
        });
        match node {
            None => Ok(None),
            Some(node) => {
                let value = decode_node_value(node, &self.registry, &self.allow)
                    .with_context(|| format!("Failed to decode record '{name}'"))?;
                Ok(Some(value))
            }
        }
    }

    /// Decode every record in document order (diagnostics/CLI use)
    pub fn records(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for child in self.root.children() {
            if child.name != format::RECORD_NODE {
                continue;
            }
            let record = decode_record(child, &self.registry, &self.allow)
                .with_context(|| {
                    format!(
                        "Failed to decode record '{}'",
                        child.attr(format::NAME_ATTR).unwrap_or("")
                    )
                })?;
            records.push(record);
        }
        Ok(records)
    }
}

/// Drives the full serialization cycle for a set of listeners
#[derive(Default)]
pub struct StateSerializer {
    options: SerializerOptions,
}

impl StateSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SerializerOptions) -> Self {
        Self { options }
    }

    /// Default settings location: platform config dir + app dir + file name
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    fn allow_list(&self) -> TypeAllowList {
        let mut allow = TypeAllowList::builtin();
        for pattern in &self.options.extra_allowed {
            allow.allow(pattern.clone());
        }
        allow
    }

    /// Create the output file and write the byte-order mark and header line
    /// before any listener runs; codecs are installed fresh per open
    pub fn open_write(&self, path: &Path) -> Result<SettingsWriter> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {}", parent.display()))?;
        }
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create settings file {}", path.display()))?;
        file.write_all(format::BOM)
            .context("Failed to write byte-order mark")?;
        writeln!(file, "{}", format::HEADER).context("Failed to write document header")?;
        Ok(SettingsWriter {
            file,
            root: Node::new(format::ROOT_NODE),
            registry: CodecRegistry::with_builtins(),
        })
    }

    /// Read and parse the document, installing codecs and the allow-list
    pub fn open_read(&self, path: &Path) -> Result<SettingsReader> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let root = read_document(&contents)
            .with_context(|| format!("Failed to parse settings document {}", path.display()))?;
        if root.name != format::ROOT_NODE {
            bail!("not a settings document: root element is <{}>", root.name);
        }
        Ok(SettingsReader {
            root,
            registry: CodecRegistry::with_builtins(),
            allow: self.allow_list(),
        })
    }

    /// Apply defaults on every listener in registration order (no stream)
    pub fn run_defaults(&self, registry: &mut StateRegistry) {
        info!(listeners = registry.len(), "applying default state");
        for listener in &mut registry.listeners {
            listener.on_set_default_state();
        }
    }

    /// Read phase: the first listener failure aborts the remaining ones.
    /// State already applied by earlier listeners is not rolled back.
    pub fn run_read(&self, registry: &mut StateRegistry, input: &SettingsReader) -> Result<()> {
        for (index, listener) in registry.listeners.iter_mut().enumerate() {
            listener
                .on_read_state(input)
                .with_context(|| format!("listener #{index} failed while reading state"))?;
        }
        Ok(())
    }

    /// Write phase: the first listener failure aborts the remaining ones.
    /// Records already written by earlier listeners stay in the document.
    pub fn run_write(&self, registry: &mut StateRegistry, output: &mut SettingsWriter) -> Result<()> {
        for (index, listener) in registry.listeners.iter_mut().enumerate() {
            listener
                .on_write_state(output)
                .with_context(|| format!("listener #{index} failed while writing state"))?;
        }
        Ok(())
    }

    /// Serialize the accumulated body into the open file and close it
    ///
    /// Body-write failures surface; the final flush failure is reported but
    /// never re-thrown.
    pub fn close_write(&self, mut writer: SettingsWriter) -> Result<()> {
        document::write_body(&mut writer.file, &writer.root)
            .context("Failed to write settings document body")?;
        if let Err(e) = writer.file.sync_all() {
            error!(error = %e, "failed to flush settings file on close");
        }
        Ok(())
    }

    /// Full read cycle with fallback: on any failure the error is reported
    /// and every listener gets its defaults instead
    ///
    /// Returns whether persisted state was applied.
    pub fn load(&self, registry: &mut StateRegistry, path: &Path) -> bool {
        let reader = match self.open_read(path) {
            Ok(reader) => reader,
            Err(e) => {
                error!(path = %path.display(), error = %format!("{e:#}"), "failed to open settings; falling back to defaults");
                self.run_defaults(registry);
                return false;
            }
        };
        match self.run_read(registry, &reader) {
            Ok(()) => {
                info!(path = %path.display(), listeners = registry.len(), "loaded settings");
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %format!("{e:#}"), "failed to read settings; falling back to defaults");
                self.run_defaults(registry);
                false
            }
        }
    }

    /// Full write cycle; close is always attempted even when a listener
    /// failed partway
    pub fn save(&self, registry: &mut StateRegistry, path: &Path) -> Result<()> {
        let mut writer = self.open_write(path)?;
        let written = self.run_write(registry, &mut writer);
        if let Err(e) = &written {
            error!(path = %path.display(), error = %format!("{e:#}"), "state write aborted; records written so far are kept");
        }
        let closed = self.close_write(writer);
        written.and(closed)
    }
}
