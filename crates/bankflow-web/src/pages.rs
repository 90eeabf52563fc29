//! HTML pages rendered with minijinja.
//!
//! Templates are compiled into the binary.

use bankflow_core::account::AccountData;
use bankflow_core::bank::Bank;
use bankflow_core::error::{BankflowError, MissingField, Result};
use minijinja::{Environment, context};
use serde::Serialize;

const TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../templates/base.html")),
    ("select_aspsp.html", include_str!("../templates/select_aspsp.html")),
    ("missing_inputs.html", include_str!("../templates/missing_inputs.html")),
    ("results.html", include_str!("../templates/results.html")),
];

/// One results page section.
#[derive(Debug, Serialize)]
struct AccountSection<'a> {
    account_id: &'a str,
    files: Vec<String>,
    data: &'a bankflow_core::account::AccountDataBundle,
}

pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source).map_err(template_error)?;
        }
        Ok(Self { env })
    }

    pub fn select_aspsp(&self, banks: &[Bank], search: Option<&str>) -> Result<String> {
        self.render("select_aspsp.html", context! { aspsps => banks, search => search })
    }

    pub fn missing_inputs(&self, missing: MissingField) -> Result<String> {
        self.render(
            "missing_inputs.html",
            context! { message => missing.user_message() },
        )
    }

    pub fn results(&self, data: &[AccountData]) -> Result<String> {
        let sections: Vec<AccountSection<'_>> = data
            .iter()
            .map(|item| AccountSection {
                account_id: &item.account_id,
                files: item.file_names(),
                data: &item.data,
            })
            .collect();
        self.render("results.html", context! { results => sections })
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let template = self.env.get_template(name).map_err(template_error)?;
        template.render(ctx).map_err(template_error)
    }
}

fn template_error(err: minijinja::Error) -> BankflowError {
    BankflowError::Internal(format!("template error: {err}"))
}
