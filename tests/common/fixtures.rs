use std::path::Path;

/// A trimmed generated `navtreedata.js`.
pub const NAVTREEDATA: &str = r#"var NAVTREE =
[
  [ "lwIP", "index.html", [
    [ "Overview", "index.html", null ],
    [ "Upgrading", "upgrading.html", null ],
    [ "Modules", "modules.html", "modules" ],
    [ "Data Structures", "annotated.html", [
      [ "Data Structures", "annotated.html", "annotated_dup" ],
      [ "Data Fields", "functions.html", null ]
    ] ],
    [ "Files", null, [
      [ "File List", "files.html", "files" ]
    ] ]
  ] ]
];

var NAVTREEINDEX =
[
"annotated.html",
"group__netbuf.html",
"group__netbuf.html#ga02f82348ac23431a4b1512feae25f26b",
"index.html",
"upgrading.html",
"tcp_8c.html"
];

var SYNCONMSG = 'click to disable panel synchronisation';
var SYNCOFFMSG = 'click to enable panel synchronisation';
"#;

pub const MODULES_JS: &str = r#"var modules =
[
    [ "Infrastructure", "group__infrastructure.html", [
      [ "Network buffers", "group__netbuf.html", null ]
    ] ],
    [ "APIs", "group__api.html", null ]
];
"#;

pub const ANNOTATED_DUP_JS: &str = r#"var annotated_dup =
[
    [ "netbuf", "structnetbuf.html", "structnetbuf" ]
];
"#;

/// Writes a generated HTML output directory.
///
/// `files.js` and `structnetbuf.js` are deliberately absent, so `tcp_8c.html`
/// is indexed but cannot be reached.
pub fn write_html_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::write(dir.join("navtreedata.js"), NAVTREEDATA)?;
    std::fs::write(dir.join("modules.js"), MODULES_JS)?;
    std::fs::write(dir.join("annotated_dup.js"), ANNOTATED_DUP_JS)?;
    Ok(())
}
