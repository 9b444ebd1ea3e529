//! DSL AST types and `syn::parse::Parse` implementations.

use proc_macro2::TokenStream;
use syn::parse::{Parse, ParseStream};
use syn::{braced, Ident, LitStr, Result};

// ============================================================================
// AST types
// ============================================================================

/// Top-level suite: a list of DSL items.
#[derive(Debug)]
pub struct Suite {
    pub items: Vec<DslItem>,
}

/// A single DSL node.
#[derive(Debug)]
pub enum DslItem {
    Describe(DescribeBlock),
    It(ItBlock),
    BeforeEach(HookBlock),
    AfterEach(HookBlock),
}

/// `describe "name" { ... }` / `context "name" { ... }` / `when "name" { ... }`
#[derive(Debug)]
pub struct DescribeBlock {
    pub name: LitStr,
    pub items: Vec<DslItem>,
}

/// `it "name" { ... }` / `specify "name" { ... }`
#[derive(Debug)]
pub struct ItBlock {
    pub name: LitStr,
    pub body: TokenStream,
}

/// `before_each { ... }` / `after_each { ... }`
#[derive(Debug)]
pub struct HookBlock {
    pub body: TokenStream,
}

// ============================================================================
// Parsing
// ============================================================================

impl Parse for Suite {
    fn parse(input: ParseStream) -> Result<Self> {
        let items = parse_items(input)?;
        Ok(Suite { items })
    }
}

fn parse_items(input: ParseStream) -> Result<Vec<DslItem>> {
    let mut items = Vec::new();
    while !input.is_empty() {
        items.push(input.parse::<DslItem>()?);
    }
    Ok(items)
}

impl Parse for DslItem {
    fn parse(input: ParseStream) -> Result<Self> {
        let ident: Ident = input.parse()?;
        let keyword = ident.to_string();

        match keyword.as_str() {
            "describe" | "context" | "when" => {
                let name: LitStr = input.parse()?;
                let content;
                braced!(content in input);
                let items = parse_items(&content)?;
                Ok(DslItem::Describe(DescribeBlock { name, items }))
            }
            "it" | "specify" => {
                let name: LitStr = input.parse()?;
                let body = parse_block_body(input)?;
                Ok(DslItem::It(ItBlock { name, body }))
            }
            "before_each" => Ok(DslItem::BeforeEach(HookBlock {
                body: parse_block_body(input)?,
            })),
            "after_each" => Ok(DslItem::AfterEach(HookBlock {
                body: parse_block_body(input)?,
            })),
            _ => Err(syn::Error::new(
                ident.span(),
                format!(
                    "unknown DSL keyword `{keyword}`. Expected one of: \
                     describe, context, when, it, specify, before_each, after_each"
                ),
            )),
        }
    }
}

/// Parse: `{ body }`
fn parse_block_body(input: ParseStream) -> Result<TokenStream> {
    let content;
    braced!(content in input);
    content.parse()
}
