//! Grid generator: writes the SCSS grid helper consumed by the stylesheets.
//!
//! The file defines layout variables and mixins (`wrapper`, `row-flex`,
//! `col`, `size`, `shift`, per-breakpoint variants, `from`/`to` media
//! helpers, `clearfix`, `debug`). It must exist before `styles` runs.

use super::{BuildContext, TaskError, TaskReport};
use crate::config::{Breakpoint, GridConfig};
use crate::utils::fs::write_atomic;

pub fn run(ctx: &BuildContext) -> Result<TaskReport, TaskError> {
    let grid = &ctx.config.grid;
    let scss = generate(grid)?;

    let path = grid.path.join(grid.file_name());
    write_atomic(&path, scss.as_bytes()).map_err(TaskError::io(&path))?;

    Ok(TaskReport::silent(vec![path]))
}

/// Writes lines at a nesting depth using the configured tab.
struct Scss<'a> {
    out: String,
    tab: &'a str,
}

impl Scss<'_> {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(self.tab);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    /// `@mixin name(args){ body }` where body lines carry relative depth.
    fn mixin(&mut self, signature: &str, body: &[(usize, &str)]) {
        self.line(0, &format!("@mixin {signature}{{"));
        for (depth, text) in body {
            self.line(depth + 1, text);
        }
        self.line(0, "}");
        self.blank();
    }
}

/// Render the grid helper file.
pub fn generate(grid: &GridConfig) -> Result<String, TaskError> {
    let breakpoints = grid.sorted_breakpoints()?;
    let query = if grid.mobile_first {
        "min-width"
    } else {
        "max-width"
    };

    let mut s = Scss {
        out: String::with_capacity(4096),
        tab: &grid.tab,
    };

    s.line(0, "@use \"sass:math\";");
    s.blank();
    s.line(0, &format!("$columns: {};", grid.columns));
    s.line(0, "$atom: math.div(100%, $columns);");
    s.blank();
    for Breakpoint { name, width, .. } in &breakpoints {
        s.line(0, &format!("$break_{name}: {width};"));
    }
    s.blank();
    s.line(0, &format!("$offset: {};", grid.offset));
    s.line(0, "$offset_one_side: ($offset * 0.5);");
    s.blank();
    s.line(0, &format!("$fields: {};", grid.container.fields));
    s.line(0, &format!("$max-width: {};", grid.container.max_width));
    s.blank();

    s.mixin(
        "wrapper-full()",
        &[(0, "padding-left: $fields;"), (0, "padding-right: $fields;")],
    );
    s.mixin(
        "wrapper()",
        &[
            (0, "max-width: $max-width;"),
            (0, "margin: 0 auto;"),
            (0, "@include wrapper-full();"),
        ],
    );
    s.mixin(
        "row-offsets()",
        &[
            (0, "margin-left: ($offset_one_side * -1);"),
            (0, "margin-right: ($offset_one_side * -1);"),
        ],
    );
    s.mixin(
        "col-offsets($type)",
        &[
            (0, "#{$type}-left: $offset_one_side;"),
            (0, "#{$type}-right: $offset_one_side;"),
        ],
    );
    s.mixin(
        "row-flex()",
        &[
            (0, "display: flex;"),
            (0, "flex-wrap: wrap;"),
            (0, "@include row-offsets();"),
        ],
    );
    s.mixin(
        "col()",
        &[
            (0, "box-sizing: border-box;"),
            (0, "word-wrap: break-word;"),
            (0, "@include col-offsets(margin);"),
        ],
    );
    s.mixin(
        "size($n)",
        &[
            (0, "$val: $atom * $n;"),
            (0, "width: calc(#{$val} - #{$offset});"),
        ],
    );
    s.mixin(
        "shift($n)",
        &[
            (0, "$val: $atom * $n;"),
            (0, "margin-left: calc(#{$val} + #{$offset_one_side});"),
        ],
    );

    for Breakpoint { name, .. } in &breakpoints {
        let media = format!("@media screen and ({query}: $break_{name}){{");
        s.mixin(
            &format!("{name}-block()"),
            &[(0, media.as_str()), (1, "@content;"), (0, "}")],
        );
        s.mixin(
            &format!("size-{name}($n)"),
            &[(0, media.as_str()), (1, "@include size($n);"), (0, "}")],
        );
        s.mixin(
            &format!("shift-{name}($n)"),
            &[(0, media.as_str()), (1, "@include shift($n);"), (0, "}")],
        );
    }

    s.mixin(
        "from($min_width)",
        &[
            (0, "@media screen and (min-width: $min_width){"),
            (1, "@content;"),
            (0, "}"),
        ],
    );
    s.mixin(
        "to($max_width)",
        &[
            (0, "@media screen and (max-width: $max_width){"),
            (1, "@content;"),
            (0, "}"),
        ],
    );
    s.mixin(
        "clearfix()",
        &[
            (0, "&::after{"),
            (1, "display: block;"),
            (1, "content: \"\";"),
            (1, "clear: both;"),
            (0, "}"),
        ],
    );
    s.mixin(
        "debug($background, $outline)",
        &[
            (0, "height: 100vh;"),
            (0, "position: fixed;"),
            (0, "width: 100%;"),
            (0, "> div{"),
            (1, "height: inherit;"),
            (1, "@include wrapper();"),
            (1, "> div{"),
            (2, "height: inherit;"),
            (2, "@include row-flex();"),
            (2, "> div{"),
            (3, "@include col();"),
            (3, "@include size(1);"),
            (3, "height: inherit;"),
            (3, "outline: $outline;"),
            (3, "background: $background;"),
            (2, "}"),
            (1, "}"),
            (0, "}"),
        ],
    );

    // trailing blank line from the last mixin
    s.out.pop();
    Ok(s.out)
}
