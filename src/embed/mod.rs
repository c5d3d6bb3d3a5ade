//! Embedded static resources.
//!
//! - `serve` - dev server client (livereload.js, minified by `build.rs`)
//! - `bundle` - module runtime wrapped around script bundles
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{LIVERELOAD_JS, LivereloadVars};
//!
//! let js = LIVERELOAD_JS.render(&LivereloadVars { ws_port: 35729 });
//! ```

use std::marker::PhantomData;

/// Trait for template variable sets
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// Template with typed variable injection
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _marker: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }
}

pub mod bundle {
    use super::{Template, TemplateVars};

    /// Module function bodies, joined by `,`.
    pub struct RuntimeVars {
        pub modules: String,
    }

    impl TemplateVars for RuntimeVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__KILN_MODULES__", &self.modules)
        }
    }

    /// Module registry and `require` used by script bundles; module 0 is
    /// the entry.
    pub const RUNTIME_JS: Template<RuntimeVars> =
        Template::new(include_str!("bundle/runtime.js"));
}

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL path the dev server answers with the live-reload client.
    pub const LIVERELOAD_URL: &str = "/__kiln/livereload.js";

    /// Variables for livereload.js.
    pub struct LivereloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for LivereloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__KILN_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live reload client with WebSocket port injection.
    pub const LIVERELOAD_JS: Template<LivereloadVars> =
        Template::new(include_str!(concat!(env!("OUT_DIR"), "/livereload.min.js")));

    /// `<script>` tag referencing the client.
    pub fn script_tag() -> String {
        format!(r#"<script src="{LIVERELOAD_URL}" defer></script>"#)
    }

}
