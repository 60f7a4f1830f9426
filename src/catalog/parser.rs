use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::icons::icon_search_dirs;
use super::{Catalog, CatalogBuilder, MenuEntry, HELP_CATEGORY, LEAVE_CATEGORY, SYSTEM_CATEGORY};
use crate::error::{MenuError, Result};
use crate::i18n::CategoryAliasTable;
use crate::menu_error;
use crate::utils::read_source;

const HELP_LABELS: [&str; 2] = ["help", "ayuda"];
const LEAVE_LABELS: [&str; 4] = ["leave", "salir", "exit", "logout"];

/// Чем закончился разбор меню
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed { categories: usize, entries: usize },
    /// Меню не прочитано, взят встроенный каталог; внутри причина
    Fallback(String),
}

impl ParseOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Результат одного прохода: каталог и каталоги иконок всегда заполнены
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub icon_dirs: Vec<PathBuf>,
    pub outcome: ParseOutcome,
}

pub struct MenuCatalogParser<'a> {
    menu_file: PathBuf,
    aliases: &'a CategoryAliasTable,
}

impl<'a> MenuCatalogParser<'a> {
    pub fn new(menu_file: impl Into<PathBuf>, aliases: &'a CategoryAliasTable) -> Self {
        Self {
            menu_file: menu_file.into(),
            aliases,
        }
    }

    /// Разбирает файл меню.
    ///
    /// Отсутствующий, повреждённый или пустой файл дают встроенный каталог.
    /// Ошибкой возвращается только путь, который указывает на каталог.
    pub fn parse(&self) -> Result<CatalogLoad> {
        let outcome = read_source(&self.menu_file).and_then(|content| self.parse_document(&content));

        match outcome {
            Ok(load) => Ok(load),
            Err(e) if e.is_recoverable() => {
                warn!("Меню {:?} не прочитано ({}), используем встроенный каталог", self.menu_file, e);
                Ok(Self::fallback(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub fn parse_str(&self, content: &str) -> CatalogLoad {
        self.parse_document(content)
            .unwrap_or_else(|e| Self::fallback(e.to_string()))
    }

    fn fallback(reason: String) -> CatalogLoad {
        CatalogLoad {
            catalog: Catalog::fallback(),
            icon_dirs: icon_search_dirs(Vec::<String>::new()),
            outcome: ParseOutcome::Fallback(reason),
        }
    }

    fn parse_document(&self, content: &str) -> Result<CatalogLoad> {
        let document = walk(content)?;
        let mut builder = CatalogBuilder::default();

        for (label, entries) in document.menus {
            if label.is_empty() {
                continue;
            }
            let key = self.aliases.normalize(&label);
            debug!("Группа '{}' → '{}' ({} записей)", label, key, entries.len());
            builder.extend(key, entries);
        }

        // Программы верхнего уровня не теряются, даже если для них нет группы
        let mut loose = Vec::new();
        for entry in document.root_programs.into_iter().chain(document.root_menu_programs) {
            match special_category(&entry.name) {
                Some(key) => builder.push(key, entry),
                None => loose.push(entry),
            }
        }
        builder.extend(SYSTEM_CATEGORY, loose);

        if builder.is_empty() {
            return Err(menu_error!(malformed, "в меню нет ни одной записи"));
        }

        let catalog = builder.build();
        let outcome = ParseOutcome::Parsed {
            categories: catalog.len(),
            entries: catalog.entry_count(),
        };
        info!(
            "Меню разобрано: {} категорий, {} записей",
            catalog.len(),
            catalog.entry_count()
        );

        Ok(CatalogLoad {
            catalog,
            icon_dirs: icon_search_dirs(document.icon_paths),
            outcome,
        })
    }
}

fn special_category(label: &str) -> Option<&'static str> {
    let lower = label.to_lowercase();
    if HELP_LABELS.contains(&lower.as_str()) {
        Some(HELP_CATEGORY)
    } else if LEAVE_LABELS.contains(&lower.as_str()) {
        Some(LEAVE_CATEGORY)
    } else {
        None
    }
}

/// Всё, что нужно из документа, в порядке появления
#[derive(Debug, Default)]
struct MenuDocument {
    menus: Vec<(String, Vec<MenuEntry>)>,
    root_programs: Vec<MenuEntry>,
    root_menu_programs: Vec<MenuEntry>,
    icon_paths: Vec<String>,
}

#[derive(Debug, Default)]
struct ProgramNode {
    label: String,
    icon: String,
    tooltip: String,
    command: String,
}

impl ProgramNode {
    fn from_start(e: &BytesStart) -> Result<Self> {
        let mut node = Self::default();
        for attr in e.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?.into_owned();
            match attr.key.as_ref() {
                b"label" => node.label = value,
                b"icon" => node.icon = value,
                b"tooltip" => node.tooltip = value,
                _ => {}
            }
        }
        Ok(node)
    }

    fn into_entry(self) -> Option<MenuEntry> {
        MenuEntry::new(&self.label, &self.command, &self.icon, &self.tooltip)
    }
}

/// Открытые элементы на пути от корня
#[derive(Debug)]
enum Frame {
    Root,
    RootMenu,
    /// Индекс в `MenuDocument::menus`, выделенный при открытии тега
    Menu(usize),
    Program(ProgramNode),
    IconPath(String),
    Other,
}

fn menu_label(e: &BytesStart) -> Result<String> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"label" {
            return Ok(attr.unescape_value()?.trim().to_string());
        }
    }
    Ok("Unknown".to_string())
}

fn walk(content: &str) -> Result<MenuDocument> {
    let mut reader = Reader::from_str(content);
    let mut document = MenuDocument::default();
    let mut stack: Vec<Frame> = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let frame = if stack.is_empty() {
                    if seen_root {
                        return Err(menu_error!(malformed, "больше одного корневого элемента"));
                    }
                    seen_root = true;
                    Frame::Root
                } else {
                    open_frame(e, &mut document)?
                };
                stack.push(frame);
            }
            // Пустой Program без команды отбрасывается, пустой Menu ничего не добавляет
            Event::Empty(ref e) => {
                if stack.is_empty() {
                    seen_root = true;
                } else if e.name().as_ref() == b"Menu" {
                    document.menus.push((menu_label(e)?, Vec::new()));
                }
            }
            Event::Text(ref t) => {
                let text = t.unescape()?;
                append_text(&mut stack, &text);
            }
            Event::CData(t) => {
                let bytes = t.into_inner();
                append_text(&mut stack, &String::from_utf8_lossy(&bytes));
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| menu_error!(malformed, "лишний закрывающий тег"))?;
                close_frame(frame, stack.last(), &mut document);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(menu_error!(malformed, "документ оборван: {} незакрытых элементов", stack.len()));
    }
    if !seen_root {
        return Err(MenuError::SourceMalformed("в документе нет корневого элемента".to_string()));
    }

    Ok(document)
}

fn open_frame(e: &BytesStart, document: &mut MenuDocument) -> Result<Frame> {
    Ok(match e.name().as_ref() {
        b"Menu" => {
            document.menus.push((menu_label(e)?, Vec::new()));
            Frame::Menu(document.menus.len() - 1)
        }
        b"RootMenu" => Frame::RootMenu,
        b"Program" => Frame::Program(ProgramNode::from_start(e)?),
        b"IconPath" => Frame::IconPath(String::new()),
        _ => Frame::Other,
    })
}

fn append_text(stack: &mut [Frame], text: &str) {
    match stack.last_mut() {
        Some(Frame::Program(node)) => node.command.push_str(text),
        Some(Frame::IconPath(path)) => path.push_str(text),
        _ => {}
    }
}

fn close_frame(frame: Frame, parent: Option<&Frame>, document: &mut MenuDocument) {
    match frame {
        Frame::Program(node) => {
            let Some(entry) = node.into_entry() else {
                return;
            };
            match parent {
                Some(Frame::Menu(index)) => document.menus[*index].1.push(entry),
                Some(Frame::Root) => document.root_programs.push(entry),
                Some(Frame::RootMenu) => document.root_menu_programs.push(entry),
                _ => {}
            }
        }
        Frame::IconPath(path) => {
            let path = path.trim();
            if !path.is_empty() {
                document.icon_paths.push(path.to_string());
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const JWMRC: &str = r#"<?xml version="1.0"?>
<JWM>
  <IconPath>/usr/share/icons/custom</IconPath>
  <IconPath>/usr/share/pixmaps</IconPath>
  <RootMenu onroot="3" label="Menu">
    <Menu label="Internet" icon="www.png">
      <Program label="Firefox" icon="firefox.png" tooltip="Web browser">firefox</Program>
    </Menu>
    <Menu label="Sistema">
      <Program label="Terminal" icon="term.png">urxvt -e bash</Program>
      <Program label="" icon="x.png">nameless</Program>
      <Program label="No command"/>
      <Menu label="Juegos">
        <Program label="Chess">xboard</Program>
      </Menu>
    </Menu>
    <Menu label="Internet">
      <Program label="Mail">sylpheed &amp;&amp; true</Program>
    </Menu>
    <Program label="Help">defaulthtmlviewer /usr/share/doc/index.html</Program>
    <Program label="Salir">logout</Program>
    <Program label="Run">gexec</Program>
  </RootMenu>
  <Program label="Ayuda">man man</Program>
</JWM>"#;

    fn aliases() -> CategoryAliasTable {
        let mut table = CategoryAliasTable::default();
        table.insert("Sistema", "System");
        table.insert("Juegos", "Fun");
        table
    }

    #[test]
    fn test_groups_are_normalized_and_ordered() {
        let aliases = aliases();
        let load = MenuCatalogParser::new("/unused", &aliases).parse_str(JWMRC);
        let keys: Vec<&str> = load.catalog.keys().collect();

        assert_eq!(keys, vec!["System", "Internet", "Fun", "Help", "Leave"]);
        assert!(matches!(load.outcome, ParseOutcome::Parsed { categories: 5, .. }));
    }

    #[test]
    fn test_same_label_groups_merge_in_document_order() {
        let aliases = aliases();
        let load = MenuCatalogParser::new("/unused", &aliases).parse_str(JWMRC);
        let internet = load.catalog.get("Internet").unwrap();

        assert_eq!(internet.len(), 2);
        assert_eq!(internet[0].name, "Firefox");
        assert_eq!(internet[0].comment, "Web browser");
        assert_eq!(internet[1].name, "Mail");
        assert_eq!(internet[1].command, "sylpheed && true");
    }

    #[test]
    fn test_entries_without_name_or_command_are_dropped() {
        let aliases = aliases();
        let load = MenuCatalogParser::new("/unused", &aliases).parse_str(JWMRC);
        let system = load.catalog.get("System").unwrap();

        let names: Vec<&str> = system.iter().map(|e| e.name.as_str()).collect();
        // Run — программа RootMenu без группы, попадает в System после группы
        assert_eq!(names, vec!["Terminal", "Run"]);
        assert!(system[0].is_terminal);
        assert!(!system[1].is_terminal);
    }

    #[test]
    fn test_help_and_leave_by_label() {
        let aliases = aliases();
        let load = MenuCatalogParser::new("/unused", &aliases).parse_str(JWMRC);

        let help: Vec<&str> = load.catalog.get("Help").unwrap().iter().map(|e| e.name.as_str()).collect();
        // Сначала прямые потомки корня, затем RootMenu
        assert_eq!(help, vec!["Ayuda", "Help"]);
        assert_eq!(load.catalog.get("Leave").unwrap()[0].command, "logout");
    }

    #[test]
    fn test_icon_dirs_declared_then_defaults() {
        let aliases = aliases();
        let load = MenuCatalogParser::new("/unused", &aliases).parse_str(JWMRC);

        assert_eq!(load.icon_dirs[0], PathBuf::from("/usr/share/icons/custom"));
        assert_eq!(load.icon_dirs[1], PathBuf::from("/usr/share/pixmaps"));
        let pixmaps = load
            .icon_dirs
            .iter()
            .filter(|d| **d == PathBuf::from("/usr/share/pixmaps"))
            .count();
        assert_eq!(pixmaps, 1);
    }

    #[test]
    fn test_two_internet_groups_scenario() {
        let aliases = CategoryAliasTable::default();
        let doc = r#"<JWM>
  <Menu label="Internet"><Program label="A">a</Program></Menu>
  <Menu label="Internet"><Program label="B">b</Program></Menu>
</JWM>"#;
        let load = MenuCatalogParser::new("/unused", &aliases).parse_str(doc);

        assert_eq!(load.catalog.len(), 1);
        let names: Vec<&str> = load.catalog.get("Internet").unwrap().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_fallback_for_bad_inputs() {
        let aliases = CategoryAliasTable::default();
        let parser = MenuCatalogParser::new("/unused", &aliases);

        for doc in ["", "<JWM>", "<JWM><Menu label=\"X\"></JWM>", "<JWM></JWM>", "not xml at all", "<JWM/>"] {
            let load = parser.parse_str(doc);
            assert!(load.outcome.is_fallback(), "ожидался fallback для {:?}", doc);
            assert!(load.catalog.categories().iter().any(|c| !c.entries.is_empty()));
        }
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let aliases = CategoryAliasTable::default();
        let load = MenuCatalogParser::new(dir.path().join("jwmrc"), &aliases).parse().unwrap();

        assert!(load.outcome.is_fallback());
        assert!(load.catalog.contains("System"));
        assert!(load.catalog.contains("Internet"));
    }

    #[test]
    fn test_directory_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let aliases = CategoryAliasTable::default();
        assert!(MenuCatalogParser::new(dir.path(), &aliases).parse().is_err());
    }

    #[test]
    fn test_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jwmrc");
        fs::write(&path, JWMRC).unwrap();

        let aliases = aliases();
        let load = MenuCatalogParser::new(&path, &aliases).parse().unwrap();
        assert!(!load.outcome.is_fallback());
        assert_eq!(load.catalog.entry_count(), 8);
    }
}
