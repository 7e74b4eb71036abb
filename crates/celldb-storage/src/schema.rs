use rusqlite::Connection;

pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    // Ensure foreign keys are enforced (disabled by default in SQLite).
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r#"
        -- Registries
        CREATE TABLE IF NOT EXISTS projects (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL UNIQUE,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project_metadata (
          project_id INTEGER NOT NULL REFERENCES projects(id),
          key TEXT NOT NULL,
          value TEXT,
          PRIMARY KEY (project_id, key)
        );

        CREATE TABLE IF NOT EXISTS sheets (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          project_id INTEGER NOT NULL REFERENCES projects(id),
          name TEXT NOT NULL,
          sheet_index INTEGER NOT NULL DEFAULT 0,
          max_row INTEGER,
          max_column INTEGER,
          structure JSON,
          UNIQUE (project_id, name)
        );

        -- Style dimension tables. Rows are immutable value objects; the
        -- uniqueness constraint spans every attribute column.
        CREATE TABLE IF NOT EXISTS fonts (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT, sz REAL, b INTEGER, i INTEGER, u TEXT, strike INTEGER,
          color TEXT, color_theme INTEGER, color_tint REAL,
          vert_align TEXT, scheme TEXT,
          UNIQUE (name, sz, b, i, u, strike, color, color_theme, color_tint,
                  vert_align, scheme)
        );

        CREATE TABLE IF NOT EXISTS pattern_fills (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          pattern_type TEXT, fg_color TEXT, bg_color TEXT,
          UNIQUE (pattern_type, fg_color, bg_color)
        );

        CREATE TABLE IF NOT EXISTS borders (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          "left" TEXT, "right" TEXT, "top" TEXT, "bottom" TEXT, diagonal TEXT,
          left_color TEXT, right_color TEXT, top_color TEXT, bottom_color TEXT,
          diagonal_color TEXT,
          UNIQUE ("left", "right", "top", "bottom", diagonal, left_color,
                  right_color, top_color, bottom_color, diagonal_color)
        );

        CREATE TABLE IF NOT EXISTS alignments (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          horizontal TEXT, vertical TEXT, wrap_text INTEGER,
          shrink_to_fit INTEGER, indent INTEGER, text_rotation INTEGER,
          UNIQUE (horizontal, vertical, wrap_text, shrink_to_fit, indent,
                  text_rotation)
        );

        CREATE TABLE IF NOT EXISTS protections (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          locked INTEGER, hidden INTEGER,
          UNIQUE (locked, hidden)
        );

        CREATE TABLE IF NOT EXISTS cell_styles (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          font_id INTEGER REFERENCES fonts(id),
          fill_id INTEGER REFERENCES pattern_fills(id),
          border_id INTEGER REFERENCES borders(id),
          alignment_id INTEGER REFERENCES alignments(id),
          protection_id INTEGER REFERENCES protections(id),
          num_fmt_id INTEGER,
          xf_id INTEGER,
          quote_prefix INTEGER,
          UNIQUE (font_id, fill_id, border_id, alignment_id, protection_id,
                  num_fmt_id, xf_id, quote_prefix)
        );

        -- `id` doubles as insertion order; overlapping ranges are applied in
        -- id order by consumers (last applied wins).
        CREATE TABLE IF NOT EXISTS styled_ranges (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          sheet_id INTEGER NOT NULL REFERENCES sheets(id),
          range_address TEXT NOT NULL,
          style_id INTEGER NOT NULL REFERENCES cell_styles(id),
          UNIQUE (sheet_id, range_address, style_id)
        );

        CREATE INDEX IF NOT EXISTS idx_styled_ranges_sheet
          ON styled_ranges(sheet_id);

        -- Maps a sheet to its physical value table.
        CREATE TABLE IF NOT EXISTS value_tables_registry (
          sheet_id INTEGER NOT NULL UNIQUE REFERENCES sheets(id),
          table_name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS formulas (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          sheet_id INTEGER NOT NULL REFERENCES sheets(id),
          cell TEXT NOT NULL,
          formula TEXT NOT NULL,
          "references" TEXT,
          UNIQUE (sheet_id, cell)
        );

        CREATE INDEX IF NOT EXISTS idx_formulas_sheet ON formulas(sheet_id);

        CREATE TABLE IF NOT EXISTS charts (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          sheet_id INTEGER NOT NULL REFERENCES sheets(id),
          chart_type TEXT NOT NULL,
          title TEXT,
          anchor_row INTEGER,
          anchor_col INTEGER,
          width REAL,
          height REAL,
          style INTEGER,
          legend_position TEXT,
          auto_scaling INTEGER,
          plot_vis_only INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_charts_sheet ON charts(sheet_id);

        CREATE TABLE IF NOT EXISTS chart_axes (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          chart_id INTEGER NOT NULL REFERENCES charts(id),
          role TEXT,
          ax_id INTEGER,
          position TEXT,
          hidden INTEGER,
          title TEXT,
          num_fmt TEXT,
          major_tick_mark TEXT,
          minor_tick_mark TEXT,
          tick_label_position TEXT,
          crosses TEXT,
          crosses_at REAL,
          major_unit REAL,
          minor_unit REAL,
          min REAL,
          max REAL,
          orientation TEXT,
          log_base REAL,
          major_gridlines INTEGER,
          minor_gridlines INTEGER
        );

        CREATE TABLE IF NOT EXISTS chart_series (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          chart_id INTEGER NOT NULL REFERENCES charts(id),
          idx INTEGER NOT NULL,
          order_index INTEGER NOT NULL,
          title_ref TEXT,
          shape TEXT,
          smooth INTEGER,
          invert_if_negative INTEGER
        );

        -- Data sources link to a series by (chart_id, series_idx): series row
        -- ids are not known to the caller at construction time.
        CREATE TABLE IF NOT EXISTS chart_data_sources (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          chart_id INTEGER NOT NULL REFERENCES charts(id),
          series_idx INTEGER NOT NULL,
          role TEXT NOT NULL,
          formula TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS merged_cells_ranges (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          sheet_id INTEGER NOT NULL REFERENCES sheets(id),
          range_address TEXT NOT NULL,
          UNIQUE (sheet_id, range_address)
        );

        -- Append-only; no update or delete is ever issued against this table.
        CREATE TABLE IF NOT EXISTS edit_history (
          history_id INTEGER PRIMARY KEY AUTOINCREMENT,
          project_id INTEGER NOT NULL REFERENCES projects(id),
          sheet_id INTEGER REFERENCES sheets(id),
          cell_address TEXT,
          action TEXT NOT NULL,
          old_value TEXT,
          new_value TEXT,
          edited_at TEXT NOT NULL,
          user TEXT,
          details JSON
        );

        CREATE INDEX IF NOT EXISTS idx_edit_history_sheet
          ON edit_history(sheet_id);
        "#,
    )?;

    Ok(())
}
