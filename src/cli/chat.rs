use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::chat::ChatBuilder;
use crate::core::AppConfig;
use crate::openai::PromptClient;

pub async fn run(config: AppConfig) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let client = Arc::new(PromptClient::from_config(&config));
    let chat = ChatBuilder::new(client).build();

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                // Blank lines are a no-op
                if let Some(reply) = chat.submit(&line).await {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add line to history: {}", e);
                    }
                    println!("Bot: {}", reply.content());
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
