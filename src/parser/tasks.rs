//! Token-based task and workflow parsing for WDL

use super::declarations::{parse_input_section, parse_output_section};
use super::expressions::parse_expression;
use super::literals::{parse_placeholder_options, rewrite_adds_for_interpolation};
use super::parser_utils::ParseResult;
use super::statements::parse_workflow_element;
use super::token_stream::TokenStream;
use super::tokens::Token;
use crate::error::WdlError;
use crate::expr::{Expression, ExpressionBase, StringPart};
use crate::tree::{Declaration, Task, Workflow, WorkflowElement};
use std::collections::HashMap;

/// Parse metadata section: meta { key: value, ... }
pub fn parse_meta_section(
    stream: &mut TokenStream,
) -> ParseResult<HashMap<String, serde_json::Value>> {
    // Expect "meta" or "parameter_meta" keyword
    let _keyword = match stream.peek_token() {
        Some(Token::Keyword(kw)) if kw == "meta" || kw == "parameter_meta" => {
            let kw = kw.clone();
            stream.next();
            kw
        }
        _ => {
            return Err(WdlError::syntax_error(
                stream.current_position(),
                "Expected 'meta' or 'parameter_meta' keyword".to_string(),
                "1.0".to_string(),
                None,
            ));
        }
    };

    stream.expect(Token::LeftBrace)?;

    let mut meta = HashMap::new();

    // Parse key-value pairs
    while stream.peek_token() != Some(Token::RightBrace) && !stream.is_eof() {
        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }

        if stream.peek_token() == Some(Token::RightBrace) {
            break;
        }

        // Parse key (identifier or keyword)
        let key = match stream.peek_token() {
            Some(Token::Identifier(k)) | Some(Token::Keyword(k)) => {
                let key = k.clone();
                stream.next();
                key
            }
            _ => {
                return Err(WdlError::syntax_error(
                    stream.current_position(),
                    "Expected metadata key".to_string(),
                    "1.0".to_string(),
                    None,
                ));
            }
        };

        stream.expect(Token::Colon)?;

        // Parse value - for now, parse as expression and convert to JSON
        // In a real implementation, we'd parse JSON-like values directly
        let value_expr = parse_expression(stream)?;

        // Convert expression to JSON value (simplified)
        let json_value = expression_to_json(&value_expr);
        meta.insert(key, json_value);

        // Optional comma
        if stream.peek_token() == Some(Token::Comma) {
            stream.next();
        }

        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }
    }

    stream.expect(Token::RightBrace)?;

    Ok(meta)
}

/// Parse runtime section: runtime { key: expression, ... }
fn parse_runtime_section(stream: &mut TokenStream) -> ParseResult<HashMap<String, Expression>> {
    // Expect "runtime" keyword
    match stream.peek_token() {
        Some(Token::Keyword(kw)) if kw == "runtime" => {
            stream.next();
        }
        _ => {
            return Err(WdlError::syntax_error(
                stream.current_position(),
                "Expected 'runtime' keyword".to_string(),
                "1.0".to_string(),
                None,
            ));
        }
    }

    stream.expect(Token::LeftBrace)?;

    let mut runtime = HashMap::new();

    // Parse key-value pairs
    while stream.peek_token() != Some(Token::RightBrace) && !stream.is_eof() {
        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }

        if stream.peek_token() == Some(Token::RightBrace) {
            break;
        }

        // Parse key
        let key = match stream.peek_token() {
            Some(Token::Identifier(k)) | Some(Token::Keyword(k)) => {
                let key = k.clone();
                stream.next();
                key
            }
            _ => {
                return Err(WdlError::syntax_error(
                    stream.current_position(),
                    "Expected runtime key".to_string(),
                    "1.0".to_string(),
                    None,
                ));
            }
        };

        stream.expect(Token::Colon)?;

        // Parse value expression
        let value = parse_expression(stream)?;
        runtime.insert(key, value);

        // Optional comma or newline
        if stream.peek_token() == Some(Token::Comma) {
            stream.next();
        }

        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }
    }

    stream.expect(Token::RightBrace)?;

    Ok(runtime)
}

/// Parse requirements section: requirements { key: expression, ... }
/// Validates that only standard WDL requirements attributes are used
fn parse_requirements_section(
    stream: &mut TokenStream,
) -> ParseResult<HashMap<String, Expression>> {
    // WDL 1.2 standard requirements attributes
    const STANDARD_REQUIREMENTS: &[&str] = &[
        "container",
        "docker",      // container (docker is alias)
        "cpu",         // CPU cores
        "memory",      // Memory (RAM)
        "gpu",         // GPU requirement
        "gpuType",     // GPU type
        "gpuCount",    // Number of GPUs
        "fpga",        // FPGA requirement
        "disks",       // Disk space
        "maxRetries",  // Maximum retry attempts
        "returnCodes", // Valid return codes
    ];

    // Expect "requirements" keyword
    match stream.peek_token() {
        Some(Token::Keyword(kw)) if kw == "requirements" => {
            stream.next();
        }
        _ => {
            return Err(WdlError::syntax_error(
                stream.current_position(),
                "Expected 'requirements' keyword".to_string(),
                "1.2".to_string(),
                None,
            ));
        }
    }

    stream.expect(Token::LeftBrace)?;

    let mut requirements = HashMap::new();

    // Parse key-value pairs
    while stream.peek_token() != Some(Token::RightBrace) && !stream.is_eof() {
        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }

        if stream.peek_token() == Some(Token::RightBrace) {
            break;
        }

        // Parse key
        let key = match stream.peek_token() {
            Some(Token::Identifier(k)) | Some(Token::Keyword(k)) => {
                let key = k.clone();
                stream.next();
                key
            }
            _ => {
                return Err(WdlError::syntax_error(
                    stream.current_position(),
                    "Expected requirements attribute name".to_string(),
                    "1.2".to_string(),
                    None,
                ));
            }
        };

        // Validate that the key is a standard requirements attribute
        if !STANDARD_REQUIREMENTS.contains(&key.as_str()) {
            return Err(WdlError::syntax_error(
                stream.current_position(),
                format!("Unknown requirements attribute '{}'. Use hints section for arbitrary attributes.", key),
                "1.2".to_string(),
                None,
            ));
        }

        stream.expect(Token::Colon)?;

        // Parse value expression
        let value = parse_expression(stream)?;
        requirements.insert(key, value);

        // Optional comma or newline
        if stream.peek_token() == Some(Token::Comma) {
            stream.next();
        }

        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }
    }

    stream.expect(Token::RightBrace)?;

    Ok(requirements)
}

/// Parse hints section: hints { key: expression, ... }
/// Allows arbitrary key-value pairs for execution engine optimization hints
fn parse_hints_section(stream: &mut TokenStream) -> ParseResult<HashMap<String, Expression>> {
    // Expect "hints" keyword
    match stream.peek_token() {
        Some(Token::Keyword(kw)) if kw == "hints" => {
            stream.next();
        }
        _ => {
            return Err(WdlError::syntax_error(
                stream.current_position(),
                "Expected 'hints' keyword".to_string(),
                "1.2".to_string(),
                None,
            ));
        }
    }

    stream.expect(Token::LeftBrace)?;

    let mut hints = HashMap::new();

    // Parse key-value pairs
    while stream.peek_token() != Some(Token::RightBrace) && !stream.is_eof() {
        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }

        if stream.peek_token() == Some(Token::RightBrace) {
            break;
        }

        // Parse key
        let key = match stream.peek_token() {
            Some(Token::Identifier(k)) | Some(Token::Keyword(k)) => {
                let key = k.clone();
                stream.next();
                key
            }
            _ => {
                return Err(WdlError::syntax_error(
                    stream.current_position(),
                    "Expected hints attribute name".to_string(),
                    "1.2".to_string(),
                    None,
                ));
            }
        };

        stream.expect(Token::Colon)?;

        // Parse value expression
        let value = parse_expression(stream)?;
        hints.insert(key, value);

        // Optional comma or newline
        if stream.peek_token() == Some(Token::Comma) {
            stream.next();
        }

        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }
    }

    stream.expect(Token::RightBrace)?;

    Ok(hints)
}

/// Parse command section: command { ... } or command <<< ... >>>
/// This method handles both regular commands and preprocessed placeholders
fn parse_command_section(stream: &mut TokenStream) -> ParseResult<Expression> {
    let pos = stream.current_position();

    // Expect "command" keyword
    match stream.peek_token() {
        Some(Token::Keyword(kw)) if kw == "command" => {
            stream.next();
        }
        _ => {
            return Err(WdlError::syntax_error(
                pos,
                "Expected 'command' keyword".to_string(),
                "1.0".to_string(),
                None,
            ));
        }
    }

    // Check for regular command blocks
    match stream.peek_token() {
        Some(Token::LeftBrace) => {
            stream.next();

            // Use special command-mode parsing to build StringParts directly
            let parts = parse_command_block_with_parts(stream)?;

            // Exit command mode before expecting closing brace
            stream.exit_command_mode();

            stream.expect(Token::RightBrace)?;

            Ok(Expression::task_command(pos, parts))
        }
        Some(Token::HeredocStart) => {
            stream.next();

            // Use special command-mode parsing for heredoc to build StringParts directly
            let parts = parse_heredoc_with_parts(stream)?;

            // Exit command mode before expecting closing heredoc marker
            stream.exit_command_mode();

            stream.expect(Token::HeredocEnd)?;

            Ok(Expression::task_command(pos, parts))
        }
        _ => Err(WdlError::syntax_error(
            stream.current_position(),
            "Expected '{' or '<<<' after 'command' keyword".to_string(),
            "1.0".to_string(),
            None,
        )),
    }
}

/// Parse command block content into StringParts using command-mode tokenization
fn parse_command_block_with_parts(stream: &mut TokenStream) -> ParseResult<Vec<StringPart>> {
    // Enter command mode for proper tokenization
    stream.enter_command_mode();

    let mut parts = Vec::new();
    let mut current_text = String::new();
    let mut depth = 1;

    while !stream.is_eof() && depth > 0 {
        match stream.peek_token() {
            Some(Token::LeftBrace) => {
                current_text.push('{');
                stream.next();
                depth += 1;
            }
            Some(Token::RightBrace) => {
                depth -= 1;
                if depth > 0 {
                    current_text.push('}');
                    stream.next();
                } else {
                    // Don't consume the closing brace - let caller handle it
                    break;
                }
            }
            Some(Token::CommandText(text)) => {
                current_text.push_str(&text);
                stream.next();
            }
            Some(Token::TildeBrace) => {
                // Save any accumulated text as a StringPart::Text
                if !current_text.is_empty() {
                    parts.push(StringPart::Text(current_text.clone()));
                    current_text.clear();
                }

                // Parse the placeholder expression directly
                stream.next(); // consume ~{ or ${
                stream.push_lexer_mode(crate::parser::lexer::LexerMode::Normal);

                // Parse placeholder options first
                let options = parse_placeholder_options(stream)?;

                // Then parse the expression
                let mut expr = parse_expression(stream)?;

                // Apply interpolation-specific rewriting for optional concatenation handling
                rewrite_adds_for_interpolation(&mut expr);

                // Expect placeholder end (either PlaceholderEnd or RightBrace in Normal mode)
                match stream.peek_token() {
                    Some(Token::PlaceholderEnd) | Some(Token::RightBrace) => {
                        stream.next(); // consume closing }
                    }
                    _ => {
                        return Err(WdlError::syntax_error(
                            stream.current_position(),
                            "Expected '}' to close placeholder".to_string(),
                            "1.0".to_string(),
                            None,
                        ));
                    }
                }
                stream.pop_lexer_mode(); // Return to command mode

                parts.push(StringPart::Placeholder {
                    expr: Box::new(expr),
                    options,
                });
            }
            Some(token) => {
                // Handle other tokens (whitespace, newlines, etc.)
                match token {
                    Token::Whitespace(s) => current_text.push_str(&s),
                    Token::Newline => current_text.push('\n'),
                    Token::Identifier(s) | Token::Keyword(s) => current_text.push_str(&s),
                    Token::IntLiteral(n) => current_text.push_str(&n.to_string()),
                    Token::FloatLiteral(f) => current_text.push_str(&f.to_string()),
                    _ => current_text.push_str(&format!("{}", token)),
                }
                stream.next();
            }
            None => break,
        }
    }

    // Add any remaining text
    if !current_text.is_empty() {
        parts.push(StringPart::Text(current_text));
    }

    // If no parts were created, add an empty text part
    if parts.is_empty() {
        parts.push(StringPart::Text(String::new()));
    }

    Ok(parts)
}

/// Parse heredoc content into StringParts using command-mode tokenization
fn parse_heredoc_with_parts(stream: &mut TokenStream) -> ParseResult<Vec<StringPart>> {
    // Enter command mode for proper tokenization
    stream.enter_command_mode();

    let mut parts = Vec::new();
    let mut current_text = String::new();

    while !stream.is_eof() {
        match stream.peek_token() {
            Some(Token::HeredocEnd) => {
                // Don't consume the closing >>> - let caller handle it
                break;
            }
            Some(Token::CommandText(text)) => {
                current_text.push_str(&text);
                stream.next();
            }
            Some(Token::TildeBrace) => {
                // Save any accumulated text as a StringPart::Text
                if !current_text.is_empty() {
                    parts.push(StringPart::Text(current_text.clone()));
                    current_text.clear();
                }

                // Parse the placeholder expression directly
                stream.next(); // consume ~{ or ${
                stream.push_lexer_mode(crate::parser::lexer::LexerMode::Normal);

                // Parse placeholder options first
                let options = parse_placeholder_options(stream)?;

                // Then parse the expression
                let mut expr = parse_expression(stream)?;

                // Apply interpolation-specific rewriting for optional concatenation handling
                rewrite_adds_for_interpolation(&mut expr);

                // Expect placeholder end (either PlaceholderEnd or RightBrace in Normal mode)
                match stream.peek_token() {
                    Some(Token::PlaceholderEnd) | Some(Token::RightBrace) => {
                        stream.next(); // consume closing }
                    }
                    _ => {
                        return Err(WdlError::syntax_error(
                            stream.current_position(),
                            "Expected '}' to close placeholder".to_string(),
                            "1.0".to_string(),
                            None,
                        ));
                    }
                }
                stream.pop_lexer_mode(); // Return to command mode

                parts.push(StringPart::Placeholder {
                    expr: Box::new(expr),
                    options,
                });
            }
            Some(token) => {
                // Handle other tokens (whitespace, newlines, etc.)
                match token {
                    Token::Whitespace(s) => current_text.push_str(&s),
                    Token::Newline => current_text.push('\n'),
                    Token::Identifier(s) | Token::Keyword(s) => current_text.push_str(&s),
                    Token::IntLiteral(n) => current_text.push_str(&n.to_string()),
                    Token::FloatLiteral(f) => current_text.push_str(&f.to_string()),
                    _ => current_text.push_str(&format!("{}", token)),
                }
                stream.next();
            }
            None => {
                return Err(WdlError::syntax_error(
                    stream.current_position(),
                    "Unexpected end of file in heredoc command".to_string(),
                    "1.0".to_string(),
                    None,
                ));
            }
        }
    }

    // Add any remaining text
    if !current_text.is_empty() {
        parts.push(StringPart::Text(current_text));
    }

    // If no parts were created, add an empty text part
    if parts.is_empty() {
        parts.push(StringPart::Text(String::new()));
    }

    Ok(parts)
}

/// Parse heredoc content until >>>
#[allow(dead_code)]
fn parse_heredoc_content(stream: &mut TokenStream) -> ParseResult<String> {
    let mut content = String::new();
    let mut buffer = String::new();

    while !stream.is_eof() {
        match stream.peek_token() {
            Some(Token::HeredocEnd) => {
                // Found the end marker
                break;
            }
            Some(Token::TildeBrace) => {
                // Start of placeholder - for now just record it
                content.push_str(&buffer);
                buffer.clear();

                let placeholder_type = stream.peek_token().unwrap().clone();
                stream.next();

                // Parse placeholder content until } (simplified handling)
                let mut placeholder_text = String::new();
                let mut depth = 1;
                while !stream.is_eof() && depth > 0 {
                    match stream.peek_token() {
                        Some(Token::LeftBrace) | Some(Token::TildeBrace) => {
                            depth += 1;
                            placeholder_text.push_str(&format!("{}", stream.peek_token().unwrap()));
                            stream.next();
                        }
                        Some(Token::RightBrace) | Some(Token::PlaceholderEnd) => {
                            depth -= 1;
                            if depth > 0 {
                                placeholder_text.push('}');
                            }
                            stream.next();
                        }
                        Some(token) => {
                            placeholder_text.push_str(&format!("{}", token));
                            stream.next();
                        }
                        None => break,
                    }
                }

                // For now, just include placeholder as literal text
                if placeholder_type == Token::TildeBrace {
                    content.push_str(&format!("~{{{}}}", placeholder_text));
                }
            }
            Some(token) => {
                // Accumulate other tokens as text
                // In a real parser, we'd preserve the exact text representation
                match token {
                    Token::Whitespace(s) => buffer.push_str(&s),
                    Token::Newline => buffer.push('\n'),
                    Token::Identifier(s) | Token::Keyword(s) => buffer.push_str(&s),
                    Token::IntLiteral(n) => buffer.push_str(&n.to_string()),
                    Token::FloatLiteral(f) => buffer.push_str(&f.to_string()),
                    Token::StringLiteral(s) => buffer.push_str(&s),
                    _ => buffer.push_str(&format!("{}", token)),
                }
                stream.next();
            }
            None => {
                return Err(WdlError::syntax_error(
                    stream.current_position(),
                    "Unexpected end of file in heredoc command".to_string(),
                    "1.0".to_string(),
                    None,
                ));
            }
        }
    }

    content.push_str(&buffer);
    Ok(content)
}

/// Parse command block content (simplified)
#[allow(dead_code)]
fn parse_command_block_content(stream: &mut TokenStream) -> ParseResult<String> {
    let mut content = String::new();
    let mut depth = 1;

    while !stream.is_eof() && depth > 0 {
        match stream.peek_token() {
            Some(Token::LeftBrace) => {
                depth += 1;
                content.push('{');
                stream.next();
            }
            Some(Token::RightBrace) => {
                depth -= 1;
                if depth > 0 {
                    content.push('}');
                    stream.next();
                } else {
                    break;
                }
            }
            Some(Token::TildeBrace) => {
                // Start of placeholder
                let placeholder_type = stream.peek_token().unwrap().clone();
                stream.next();

                // Parse placeholder content until } (simplified handling)
                let mut placeholder_text = String::new();
                let mut depth = 1;
                while !stream.is_eof() && depth > 0 {
                    match stream.peek_token() {
                        Some(Token::LeftBrace) | Some(Token::TildeBrace) => {
                            depth += 1;
                            placeholder_text.push_str(&format!("{}", stream.peek_token().unwrap()));
                            stream.next();
                        }
                        Some(Token::RightBrace) | Some(Token::PlaceholderEnd) => {
                            depth -= 1;
                            if depth > 0 {
                                placeholder_text.push('}');
                            }
                            stream.next();
                        }
                        Some(token) => {
                            placeholder_text.push_str(&format!("{}", token));
                            stream.next();
                        }
                        None => break,
                    }
                }

                // For now, just include placeholder as literal text
                if placeholder_type == Token::TildeBrace {
                    content.push_str(&format!("~{{{}}}", placeholder_text));
                }
            }
            Some(token) => {
                // Add token to content
                match token {
                    Token::Whitespace(s) => content.push_str(&s),
                    Token::Newline => content.push('\n'),
                    Token::Identifier(s) | Token::Keyword(s) => content.push_str(&s),
                    Token::IntLiteral(n) => content.push_str(&n.to_string()),
                    Token::FloatLiteral(f) => content.push_str(&f.to_string()),
                    Token::StringLiteral(s) => content.push_str(&s),
                    _ => content.push_str(&format!("{}", token)),
                }
                stream.next();
            }
            None => break,
        }
    }

    Ok(content)
}

/// Convert expression to JSON value (simplified)
fn expression_to_json(expr: &Expression) -> serde_json::Value {
    // This is a simplified conversion
    // Real implementation would handle all expression types
    if let Some(literal_value) = expr.literal() {
        if let Some(s) = literal_value.as_string() {
            serde_json::Value::String(s.to_string())
        } else if let Some(i) = literal_value.as_int() {
            serde_json::Value::Number(serde_json::Number::from(i))
        } else if let Some(f) = literal_value.as_float() {
            serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null)
        } else if let Some(b) = literal_value.as_bool() {
            serde_json::Value::Bool(b)
        } else {
            serde_json::Value::Null
        }
    } else {
        match expr {
            Expression::String { parts, .. } => {
                // Join string parts
                let s: String = parts
                    .iter()
                    .filter_map(|part| {
                        if let crate::expr::StringPart::Text(text) = part {
                            Some(text.clone())
                        } else {
                            None
                        }
                    })
                    .collect();
                serde_json::Value::String(s)
            }
            _ => serde_json::Value::String(format!("{:?}", expr)),
        }
    }
}

/// Parse a task definition
pub fn parse_task(stream: &mut TokenStream) -> ParseResult<Task> {
    let pos = stream.current_position();

    // Expect "task" keyword
    match stream.peek_token() {
        Some(Token::Keyword(kw)) if kw == "task" => {
            stream.next();
        }
        _ => {
            return Err(WdlError::syntax_error(
                pos,
                "Expected 'task' keyword".to_string(),
                "1.0".to_string(),
                None,
            ));
        }
    }

    // Parse task name
    let name = match stream.peek_token() {
        Some(Token::Identifier(n)) => {
            let name = n.clone();
            stream.next();
            name
        }
        _ => {
            return Err(WdlError::syntax_error(
                stream.current_position(),
                "Expected task name".to_string(),
                "1.0".to_string(),
                None,
            ));
        }
    };

    stream.expect(Token::LeftBrace)?;

    // Parse task sections
    let mut inputs: Vec<Declaration> = Vec::new();
    let mut postinputs: Vec<Declaration> = Vec::new();
    let mut command: Option<Expression> = None;
    let mut outputs: Vec<Declaration> = Vec::new();
    let mut runtime: HashMap<String, Expression> = HashMap::new();
    let mut requirements: HashMap<String, Expression> = HashMap::new();
    let mut hints: HashMap<String, Expression> = HashMap::new();
    let mut meta: HashMap<String, serde_json::Value> = HashMap::new();
    let mut parameter_meta: HashMap<String, serde_json::Value> = HashMap::new();

    // Track which sections are present to ensure mutual exclusivity
    let mut has_runtime = false;
    let mut has_requirements = false;
    let mut has_hints = false;

    // Parse task body
    while stream.peek_token() != Some(Token::RightBrace) && !stream.is_eof() {
        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }

        if stream.peek_token() == Some(Token::RightBrace) {
            break;
        }

        match stream.peek_token() {
            Some(Token::Keyword(kw)) => {
                match kw.as_str() {
                    "input" => {
                        inputs = parse_input_section(stream)?;
                    }
                    "command" => {
                        command = Some(parse_command_section(stream)?);
                    }
                    "output" => {
                        outputs = parse_output_section(stream)?;
                    }
                    "runtime" => {
                        if has_requirements || has_hints {
                            return Err(WdlError::syntax_error(
                                stream.current_position(),
                                "runtime section cannot be used with requirements or hints sections".to_string(),
                                "1.2".to_string(),
                                None,
                            ));
                        }
                        has_runtime = true;
                        runtime = parse_runtime_section(stream)?;
                    }
                    "requirements" => {
                        if has_runtime {
                            return Err(WdlError::syntax_error(
                                stream.current_position(),
                                "requirements section cannot be used with runtime section"
                                    .to_string(),
                                "1.2".to_string(),
                                None,
                            ));
                        }
                        has_requirements = true;
                        requirements = parse_requirements_section(stream)?;
                    }
                    "hints" => {
                        if has_runtime {
                            return Err(WdlError::syntax_error(
                                stream.current_position(),
                                "hints section cannot be used with runtime section".to_string(),
                                "1.2".to_string(),
                                None,
                            ));
                        }
                        has_hints = true;
                        hints = parse_hints_section(stream)?;
                    }
                    "meta" => {
                        meta = parse_meta_section(stream)?;
                    }
                    "parameter_meta" => {
                        parameter_meta = parse_meta_section(stream)?;
                    }
                    // Type keywords indicate a declaration
                    "String" | "Int" | "Float" | "Boolean" | "File" | "Directory" | "Array"
                    | "Map" | "Pair" | "Object" => {
                        let decl = super::declarations::parse_declaration(stream, "decl")?;
                        postinputs.push(decl);
                    }
                    _ => {
                        let pos = stream.current_position();
                        return Err(WdlError::syntax_error(
                            pos,
                            format!("Unexpected keyword in task: {}", kw),
                            "1.0".to_string(),
                            None,
                        ));
                    }
                }
            }
            Some(Token::Identifier(_)) => {
                // Could be a struct type declaration
                let decl = super::declarations::parse_declaration(stream, "decl")?;
                postinputs.push(decl);
            }
            _ => {
                return Err(WdlError::syntax_error(
                    stream.current_position(),
                    "Expected task section or declaration".to_string(),
                    "1.0".to_string(),
                    None,
                ));
            }
        }

        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }
    }

    stream.expect(Token::RightBrace)?;

    // Command is required
    let command = command.ok_or_else(|| {
        WdlError::syntax_error(
            pos.clone(),
            "Task must have a command section".to_string(),
            "1.0".to_string(),
            None,
        )
    })?;

    Ok(Task::new_with_requirements_hints(
        pos,
        name,
        inputs,
        postinputs,
        command,
        outputs,
        parameter_meta,
        runtime,
        requirements,
        hints,
        meta,
    ))
}

/// Parse a workflow definition
pub fn parse_workflow(stream: &mut TokenStream) -> ParseResult<Workflow> {
    let pos = stream.current_position();

    // Expect "workflow" keyword
    match stream.peek_token() {
        Some(Token::Keyword(kw)) if kw == "workflow" => {
            stream.next();
        }
        _ => {
            return Err(WdlError::syntax_error(
                pos,
                "Expected 'workflow' keyword".to_string(),
                "1.0".to_string(),
                None,
            ));
        }
    }

    // Parse workflow name
    let name = match stream.peek_token() {
        Some(Token::Identifier(n)) => {
            let name = n.clone();
            stream.next();
            name
        }
        _ => {
            return Err(WdlError::syntax_error(
                stream.current_position(),
                "Expected workflow name".to_string(),
                "1.0".to_string(),
                None,
            ));
        }
    };

    stream.expect(Token::LeftBrace)?;

    // Parse workflow sections
    let mut inputs: Vec<Declaration> = Vec::new();
    let postinputs: Vec<Declaration> = Vec::new();
    let mut body: Vec<WorkflowElement> = Vec::new();
    let mut outputs: Vec<Declaration> = Vec::new();
    let mut meta: HashMap<String, serde_json::Value> = HashMap::new();
    let mut parameter_meta: HashMap<String, serde_json::Value> = HashMap::new();

    // Parse workflow body
    while stream.peek_token() != Some(Token::RightBrace) && !stream.is_eof() {
        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }

        if stream.peek_token() == Some(Token::RightBrace) {
            break;
        }

        match stream.peek_token() {
            Some(Token::Keyword(kw)) => {
                match kw.as_str() {
                    "input" => {
                        inputs = parse_input_section(stream)?;
                    }
                    "output" => {
                        outputs = parse_output_section(stream)?;
                    }
                    "meta" => {
                        meta = parse_meta_section(stream)?;
                    }
                    "parameter_meta" => {
                        parameter_meta = parse_meta_section(stream)?;
                    }
                    _ => {
                        // Try to parse as workflow element
                        let element = parse_workflow_element(stream)?;
                        body.push(element);
                    }
                }
            }
            Some(Token::Identifier(_)) => {
                // Try to parse as workflow element (could be struct type declaration)
                let element = parse_workflow_element(stream)?;
                body.push(element);
            }
            _ => {
                return Err(WdlError::syntax_error(
                    stream.current_position(),
                    "Expected workflow section or element".to_string(),
                    "1.0".to_string(),
                    None,
                ));
            }
        }

        // Skip newlines
        while stream.peek_token() == Some(Token::Newline) {
            stream.next();
        }
    }

    stream.expect(Token::RightBrace)?;

    Ok(Workflow::new(
        pos,
        name,
        inputs,
        postinputs,
        body,
        outputs,
        parameter_meta,
        meta,
    ))
}
