use std::sync::Arc;

use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::debug;

use crate::error::NavigationFault;

/// A page element addressed by selector and position. Re-resolved on every
/// use because driver handles do not survive navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
    pub index: usize,
}

/// A stateful rendered-page session: one tab, one history.
pub trait PageSession {
    fn navigate(&mut self, url: &str) -> Result<(), NavigationFault>;
    fn find(&mut self, selector: &str) -> Result<Vec<ElementHandle>, NavigationFault>;
    fn click(&mut self, element: &ElementHandle) -> Result<(), NavigationFault>;
    fn go_back(&mut self) -> Result<(), NavigationFault>;
    fn current_markup(&mut self) -> Result<String, NavigationFault>;
}

/// [`PageSession`] backed by a Chrome tab.
pub struct ChromeSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch(headless: bool) -> anyhow::Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .build()
            .map_err(anyhow::Error::msg)?;
        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    fn eval(&self, script: &str) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(self.tab.evaluate(script, false)?.value)
    }

    fn wait(&self) -> anyhow::Result<()> {
        self.tab.wait_until_navigated()?;
        Ok(())
    }
}

/// JS expression evaluating to the NodeList for `selector`.
fn query_all(selector: &str) -> String {
    // serde_json quoting is a valid JS string literal.
    let quoted = serde_json::Value::from(selector).to_string();
    format!("document.querySelectorAll({})", quoted)
}

/// Number of matches reported by a `querySelectorAll(..).length` evaluation.
/// Anything but a non-negative integer means the lookup itself failed.
fn match_count(selector: &str, value: Option<serde_json::Value>) -> Result<usize, NavigationFault> {
    value
        .as_ref()
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .ok_or_else(|| NavigationFault::Find {
            selector: selector.to_string(),
            reason: format!("unexpected lookup result: {:?}", value),
        })
}

impl PageSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<(), NavigationFault> {
        debug!(url, "navigate");
        let fault = |e: anyhow::Error| NavigationFault::Navigate {
            url: url.to_string(),
            reason: format!("{:#}", e),
        };
        self.tab.navigate_to(url).map_err(fault)?;
        self.wait().map_err(fault)
    }

    fn find(&mut self, selector: &str) -> Result<Vec<ElementHandle>, NavigationFault> {
        let script = format!("{}.length", query_all(selector));
        let value = self.eval(&script).map_err(|e| NavigationFault::Find {
            selector: selector.to_string(),
            reason: format!("{:#}", e),
        })?;
        let count = match_count(selector, value)?;

        Ok((0..count)
            .map(|index| ElementHandle {
                selector: selector.to_string(),
                index,
            })
            .collect())
    }

    fn click(&mut self, element: &ElementHandle) -> Result<(), NavigationFault> {
        debug!(selector = %element.selector, index = element.index, "click");
        let script = format!(
            "(() => {{ const el = {}[{}]; if (!el) return false; el.scrollIntoView(); el.click(); return true; }})()",
            query_all(&element.selector),
            element.index
        );
        let fault = |e: anyhow::Error| NavigationFault::Click {
            selector: element.selector.clone(),
            index: element.index,
            reason: format!("{:#}", e),
        };

        let clicked = self.eval(&script).map_err(fault)?;
        if clicked.and_then(|v| v.as_bool()) != Some(true) {
            return Err(NavigationFault::StaleElement {
                selector: element.selector.clone(),
                index: element.index,
            });
        }
        self.wait().map_err(fault)
    }

    fn go_back(&mut self) -> Result<(), NavigationFault> {
        debug!("history back");
        self.eval("window.history.back()")
            .and_then(|_| self.wait())
            .map_err(|e| NavigationFault::Back(format!("{:#}", e)))
    }

    fn current_markup(&mut self) -> Result<String, NavigationFault> {
        self.tab
            .get_content()
            .map_err(|e| NavigationFault::Markup(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_count_reads_integer_result() {
        assert_eq!(match_count(".collapsing2 a", Some(serde_json::json!(0))).unwrap(), 0);
        assert_eq!(match_count(".collapsing2 a", Some(serde_json::json!(6))).unwrap(), 6);
    }

    #[test]
    fn missing_lookup_result_is_a_fault_not_zero() {
        for value in [None, Some(serde_json::json!("oops")), Some(serde_json::json!(-1))] {
            let err = match_count(".collapsing2 a", value).unwrap_err();
            assert!(matches!(err, NavigationFault::Find { ref selector, .. } if selector == ".collapsing2 a"));
        }
    }

    #[test]
    fn selectors_are_quoted_for_js() {
        assert_eq!(
            query_all(".resultsW a, .resultsY a"),
            r#"document.querySelectorAll(".resultsW a, .resultsY a")"#
        );
        assert_eq!(
            query_all(r#"a[title="x"]"#),
            r#"document.querySelectorAll("a[title=\"x\"]")"#
        );
    }
}
