//! Command implementations.

use anyhow::{Context as _, Result, bail};
use inkboard_core::{
    DocumentContent, DocumentDescriptor, DocumentId, DocumentStore, EditorBinding, FileSettings,
    FileStorage, InkboardConfig, Instant, KeyValueStore, SettingKey, Settings,
};
use std::io::{BufRead, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Stores opened from the resolved configuration.
pub struct Workspace {
    pub config: InkboardConfig,
    pub documents: DocumentStore<FileStorage>,
    pub settings: Settings<FileSettings>,
}

impl Workspace {
    pub fn open(config: InkboardConfig) -> Result<Self> {
        let documents_dir = config
            .documents_dir()
            .context("could not determine a data directory; pass --data-dir")?;
        let settings_path = config
            .settings_path()
            .context("could not determine a settings file; pass --data-dir")?;

        let storage = FileStorage::new(documents_dir.clone())
            .with_context(|| format!("opening document store {}", documents_dir.display()))?;
        let settings = FileSettings::open(settings_path.clone())
            .with_context(|| format!("opening settings {}", settings_path.display()))?;

        log::debug!(
            "Documents in {}, settings in {}",
            documents_dir.display(),
            settings_path.display()
        );

        Ok(Self {
            config,
            documents: DocumentStore::new(Arc::new(storage)),
            settings: Settings::new(Arc::new(settings)),
        })
    }
}

fn parse_id(raw: &str) -> Result<DocumentId> {
    DocumentId::parse(raw).with_context(|| format!("invalid document id {:?}", raw))
}

pub fn doc_get(ws: &Workspace, id: &str, out: &mut impl Write) -> Result<()> {
    let id = parse_id(id)?;
    let content = pollster::block_on(ws.documents.get(&id))
        .with_context(|| format!("reading document {}", id))?;
    writeln!(out, "{}", content.to_json()?)?;
    Ok(())
}

pub fn doc_put(ws: &Workspace, id: &str, file: Option<&Path>, input: impl Read) -> Result<()> {
    let id = parse_id(id)?;
    let json = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut json = String::new();
            let mut input = input;
            input.read_to_string(&mut json).context("reading stdin")?;
            json
        }
    };
    let content = DocumentContent::from_json(&json).context("content is not valid JSON")?;
    pollster::block_on(ws.documents.put(&id, &content))
        .with_context(|| format!("writing document {}", id))?;
    log::info!("Stored document {}", id);
    Ok(())
}

pub fn doc_list(ws: &Workspace, out: &mut impl Write) -> Result<()> {
    for id in pollster::block_on(ws.documents.list())? {
        writeln!(out, "{}", id)?;
    }
    Ok(())
}

pub fn doc_delete(ws: &Workspace, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    if !pollster::block_on(ws.documents.exists(&id))? {
        bail!("no stored document {}", id);
    }
    pollster::block_on(ws.documents.delete(&id))?;
    if ws.settings.current_document_id()?.as_ref() == Some(&id) {
        ws.settings.clear(SettingKey::CurrentDocumentId)?;
    }
    Ok(())
}

pub fn new_document(ws: &Workspace, name: &str, out: &mut impl Write) -> Result<()> {
    let descriptor = DocumentDescriptor::named(name);
    pollster::block_on(ws.documents.put(&descriptor.id, &DocumentContent::empty()))?;
    ws.settings.set_current_document_id(&descriptor.id)?;
    log::info!("Created document {} ({})", descriptor.id, descriptor.name);
    writeln!(out, "{}", descriptor.id)?;
    Ok(())
}

/// Counts from one editing session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub edits: usize,
    pub writes: usize,
    pub failed_writes: usize,
}

/// Drive an editor binding from newline-separated JSON scenes.
///
/// The hydrated content is printed first. Each input line is one change
/// event; once input ends, the last pending edit is written after the
/// quiescence window elapses.
pub fn run_edit_session<S: KeyValueStore>(
    binding: &mut EditorBinding<S>,
    descriptor: DocumentDescriptor,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<SessionSummary> {
    let mut summary = SessionSummary::default();

    let content = pollster::block_on(binding.open(descriptor))
        .cloned()
        .unwrap_or_default();
    writeln!(out, "{}", content.to_json()?)?;

    for line in input.lines() {
        let line = line.context("reading stdin")?;
        let now = Instant::now();
        record(&mut summary, pollster::block_on(binding.poll(now)));

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(scene) => {
                if binding.on_change(&scene, now) {
                    summary.edits += 1;
                }
            }
            Err(e) => log::warn!("Skipping line that is not JSON: {}", e),
        }
    }

    while let Some(deadline) = binding.next_deadline() {
        let wait = deadline.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        record(&mut summary, pollster::block_on(binding.poll(Instant::now())));
    }

    Ok(summary)
}

fn record(summary: &mut SessionSummary, outcomes: Vec<inkboard_core::FlushOutcome>) {
    for outcome in outcomes {
        if outcome.is_ok() {
            summary.writes += 1;
        } else {
            summary.failed_writes += 1;
        }
    }
}

pub fn edit(
    ws: &Workspace,
    id: Option<&str>,
    name: Option<&str>,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<SessionSummary> {
    let id = match id {
        Some(raw) => parse_id(raw)?,
        None => ws
            .settings
            .current_document_id()?
            .context("no document id given and no current document")?,
    };
    let descriptor = DocumentDescriptor::new(id.clone(), name.unwrap_or(id.as_str()));

    if let Err(e) = ws.settings.set_current_document_id(&id) {
        log::warn!("Could not remember current document: {}", e);
    }

    let mut binding = EditorBinding::with_window(ws.documents.clone(), ws.config.debounce_window());
    let summary = run_edit_session(&mut binding, descriptor, input, out)?;
    log::info!(
        "Session on {}: {} edits, {} writes, {} failed",
        id,
        summary.edits,
        summary.writes,
        summary.failed_writes
    );
    Ok(summary)
}

pub fn settings_get(ws: &Workspace, key: &str, out: &mut impl Write) -> Result<()> {
    let key: SettingKey = key.parse()?;
    if let Some(value) = ws.settings.get(key)? {
        writeln!(out, "{}", value)?;
    }
    Ok(())
}

pub fn settings_set(ws: &Workspace, key: &str, value: &str) -> Result<()> {
    let key: SettingKey = key.parse()?;
    match key {
        SettingKey::OpenMenuKeys => {
            let keys: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
            ws.settings.set_open_menu_keys(&keys)?;
        }
        SettingKey::CurrentDocumentId => ws.settings.set_current_document_id(&parse_id(value)?)?,
        SettingKey::BoardCustomFonts => {
            let fonts: Vec<String> = value.split(',').map(str::to_string).collect();
            ws.settings.set_board_custom_fonts(&fonts)?;
        }
        SettingKey::Language => ws.settings.set_language(value)?,
        SettingKey::FontSwitch => {
            let enabled = match value {
                "true" | "on" | "1" => true,
                "false" | "off" | "0" => false,
                other => bail!("font-switch expects true or false, got {:?}", other),
            };
            ws.settings.set_font_switch(enabled)?;
        }
    }
    Ok(())
}

pub fn settings_clear(ws: &Workspace, key: &str) -> Result<()> {
    let key: SettingKey = key.parse()?;
    ws.settings.clear(key)?;
    Ok(())
}

pub fn settings_list(ws: &Workspace, out: &mut impl Write) -> Result<()> {
    for key in SettingKey::ALL {
        let value = ws.settings.get(key)?.unwrap_or_default();
        writeln!(out, "{} = {}", key, value)?;
    }
    Ok(())
}

pub fn fonts_add(ws: &Workspace, name: &str) -> Result<()> {
    if !ws.settings.add_board_custom_font(name)? {
        log::info!("Font {:?} is already listed", name);
    }
    Ok(())
}

pub fn fonts_list(ws: &Workspace, out: &mut impl Write) -> Result<()> {
    for font in ws.settings.board_custom_fonts()? {
        writeln!(out, "{}", font)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn workspace(debounce_ms: u64) -> (TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let config = InkboardConfig {
            data_dir: Some(dir.path().to_path_buf()),
            debounce_ms,
            ..Default::default()
        };
        let ws = Workspace::open(config).unwrap();
        (dir, ws)
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_get_unknown_prints_empty_scene() {
        let (_dir, ws) = workspace(200);
        let mut out = Vec::new();
        doc_get(&ws, "never", &mut out).unwrap();
        assert_eq!(output(out), "{\"elements\":[]}\n");
    }

    #[test]
    fn test_put_get_list_delete() {
        let (_dir, ws) = workspace(200);

        doc_put(&ws, "b", None, Cursor::new(r#"{"elements":[1]}"#)).unwrap();
        doc_put(&ws, "a", None, Cursor::new(r#"{"elements":[2]}"#)).unwrap();

        let mut out = Vec::new();
        doc_get(&ws, "b", &mut out).unwrap();
        assert_eq!(output(out), "{\"elements\":[1]}\n");

        let mut out = Vec::new();
        doc_list(&ws, &mut out).unwrap();
        assert_eq!(output(out), "a\nb\n");

        doc_delete(&ws, "a").unwrap();
        assert!(doc_delete(&ws, "a").is_err());
    }

    #[test]
    fn test_put_rejects_bad_input() {
        let (_dir, ws) = workspace(200);
        assert!(doc_put(&ws, "doc", None, Cursor::new("{broken")).is_err());
        assert!(doc_put(&ws, "", None, Cursor::new("{}")).is_err());
    }

    #[test]
    fn test_new_sets_current_document() {
        let (_dir, ws) = workspace(200);
        let mut out = Vec::new();
        new_document(&ws, "Ideas", &mut out).unwrap();

        let id = output(out).trim().to_string();
        assert_eq!(
            ws.settings.current_document_id().unwrap().unwrap().as_str(),
            id
        );

        doc_delete(&ws, &id).unwrap();
        assert_eq!(ws.settings.current_document_id().unwrap(), None);
    }

    #[test]
    fn test_edit_session_saves_last_scene() {
        let (_dir, ws) = workspace(20);
        let input = Cursor::new("{\"elements\":[1]}\n\nnot json\n{\"elements\":[1,2]}\n");
        let mut out = Vec::new();

        let summary = edit(&ws, Some("board"), None, input, &mut out).unwrap();

        assert_eq!(output(out), "{\"elements\":[]}\n");
        assert_eq!(summary.edits, 2);
        assert_eq!(summary.failed_writes, 0);
        assert!(summary.writes >= 1);

        let mut out = Vec::new();
        doc_get(&ws, "board", &mut out).unwrap();
        assert_eq!(output(out), "{\"elements\":[1,2]}\n");
        assert_eq!(
            ws.settings.current_document_id().unwrap().unwrap().as_str(),
            "board"
        );
    }

    #[test]
    fn test_edit_defaults_to_current_document() {
        let (_dir, ws) = workspace(10);
        assert!(edit(&ws, None, None, Cursor::new(""), &mut Vec::new()).is_err());

        ws.settings
            .set_current_document_id(&DocumentId::parse("latest").unwrap())
            .unwrap();
        let summary = edit(&ws, None, None, Cursor::new("[]\n"), &mut Vec::new()).unwrap();
        assert_eq!(summary.writes, 1);
    }

    #[test]
    fn test_settings_commands() {
        let (_dir, ws) = workspace(200);

        settings_set(&ws, "language", "ja").unwrap();
        settings_set(&ws, "font-switch", "on").unwrap();
        settings_set(&ws, "open-menu-keys", "boards, recent").unwrap();
        assert!(settings_set(&ws, "font-switch", "maybe").is_err());
        assert!(settings_set(&ws, "colour", "red").is_err());

        let mut out = Vec::new();
        settings_get(&ws, "language", &mut out).unwrap();
        assert_eq!(output(out), "ja\n");

        assert!(ws.settings.font_switch().unwrap());
        assert_eq!(ws.settings.open_menu_keys().unwrap(), vec!["boards", "recent"]);

        settings_clear(&ws, "language").unwrap();
        let mut out = Vec::new();
        settings_list(&ws, &mut out).unwrap();
        let listing = output(out);
        assert!(listing.contains("language = \n"));
        assert!(listing.contains("font-switch = true\n"));
    }

    #[test]
    fn test_fonts_commands() {
        let (_dir, ws) = workspace(200);

        fonts_add(&ws, "Arial").unwrap();
        fonts_add(&ws, "Arial").unwrap();
        fonts_add(&ws, "Lora").unwrap();

        let mut out = Vec::new();
        fonts_list(&ws, &mut out).unwrap();
        assert_eq!(output(out), "Arial\nLora\n");
    }
}
