use crate::domain::model::{GameMode, GameModeConfig, Ticket, WinningNumbers};
use crate::domain::ports::{PotStore, TicketStore, WinningNumberStore};
use crate::utils::error::{PoolError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// PostgREST-style backend adapter. Tickets live in `jugadas_polla` /
/// `jugadas_micro` (one numbered column per slot), winning numbers in
/// `resultados_numeros` / `resultados_micro` (latest draw wins), and pot
/// configuration in `potes` as one JSON document per game mode.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

fn tickets_table(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Polla => "jugadas_polla",
        GameMode::Micro => "jugadas_micro",
    }
}

fn results_table(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Polla => "resultados_numeros",
        GameMode::Micro => "resultados_micro",
    }
}

#[derive(Debug, Deserialize)]
struct TicketRow {
    id: i64,
    #[serde(default)]
    nombre_jugador: String,
    #[serde(default)]
    gratis: bool,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl TicketRow {
    fn into_ticket(self, row_id: u32, mode: GameMode) -> Ticket {
        let mut ticket = Ticket::new(row_id, mode);
        ticket.external_id = Some(self.id);
        ticket.player_name = self.nombre_jugador;
        ticket.is_free_play = self.gratis;
        for slot in 0..mode.slot_count() {
            ticket.numbers[slot] = self
                .extra
                .get(&format!("nro_{}", slot + 1))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }
        ticket
    }
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    id: i64,
    #[serde(default)]
    numeros_ganadores: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PotRow {
    valores_diarios: GameModeConfig,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        validate_url("backend_url", base_url)?;
        validate_non_empty_string("api_key", api_key)?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn check(table: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PoolError::Store {
                message: format!("{} returned {}: {}", table, status, body),
            })
        }
    }

    /// The payload mirrors the column layout: one `nro_N` column per slot,
    /// empty slots as nulls.
    fn ticket_payload(mode: GameMode, ticket: &Ticket) -> Value {
        let mut payload = json!({
            "nombre_jugador": ticket.player_name,
            "gratis": ticket.is_free_play,
        });
        for slot in 0..mode.slot_count() {
            payload[format!("nro_{}", slot + 1)] = match &ticket.numbers[slot] {
                Some(token) => Value::String(token.clone()),
                None => Value::Null,
            };
        }
        if let Some(external_id) = ticket.external_id {
            payload["id"] = json!(external_id);
        }
        payload
    }

    async fn latest_result_row(&self, mode: GameMode) -> Result<Option<ResultRow>> {
        let table = results_table(mode);
        let response = self
            .request(Method::GET, table)
            .query(&[
                ("select", "*"),
                ("order", "fecha_sorteo.desc"),
                ("limit", "1"),
            ])
            .send()
            .await?;
        let rows: Vec<ResultRow> = Self::check(table, response).await?.json().await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl TicketStore for RestStore {
    async fn list_tickets(&self, mode: GameMode) -> Result<Vec<Ticket>> {
        let table = tickets_table(mode);
        tracing::debug!("Listing tickets from {}", table);

        let response = self
            .request(Method::GET, table)
            .query(&[("select", "*"), ("order", "id.asc")])
            .send()
            .await?;
        let rows: Vec<TicketRow> = Self::check(table, response).await?.json().await?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| row.into_ticket(i as u32 + 1, mode))
            .collect())
    }

    async fn upsert_ticket(&self, mode: GameMode, ticket: &Ticket) -> Result<Option<i64>> {
        let table = tickets_table(mode);
        tracing::debug!(
            "Saving ticket row={} record={:?} to {}",
            ticket.id,
            ticket.external_id,
            table
        );

        let response = self
            .request(Method::POST, table)
            .header(
                "Prefer",
                "resolution=merge-duplicates,return=representation",
            )
            .json(&Self::ticket_payload(mode, ticket))
            .send()
            .await?;
        let rows: Vec<TicketRow> = Self::check(table, response).await?.json().await?;
        Ok(rows.into_iter().next().map(|row| row.id))
    }

    async fn delete_ticket(&self, mode: GameMode, external_id: i64) -> Result<()> {
        let table = tickets_table(mode);
        let response = self
            .request(Method::DELETE, table)
            .query(&[("id", format!("eq.{}", external_id))])
            .send()
            .await?;
        Self::check(table, response).await?;
        Ok(())
    }

    async fn delete_all(&self, mode: GameMode) -> Result<()> {
        let table = tickets_table(mode);
        let response = self
            .request(Method::DELETE, table)
            .query(&[("id", "gt.0")])
            .send()
            .await?;
        Self::check(table, response).await?;
        Ok(())
    }
}

#[async_trait]
impl PotStore for RestStore {
    async fn get_config(&self, mode: GameMode) -> Result<Option<GameModeConfig>> {
        let response = self
            .request(Method::GET, "potes")
            .query(&[
                ("select", "valores_diarios".to_string()),
                ("tipo_juego", format!("eq.{}", mode)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<PotRow> = Self::check("potes", response).await?.json().await?;
        Ok(rows.into_iter().next().map(|row| row.valores_diarios))
    }

    async fn set_config(&self, mode: GameMode, config: &GameModeConfig) -> Result<()> {
        tracing::debug!("Saving pot configuration for {}", mode);
        let response = self
            .request(Method::POST, "potes")
            .query(&[("on_conflict", "tipo_juego")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&json!({
                "tipo_juego": mode.as_str(),
                "valores_diarios": config,
            }))
            .send()
            .await?;
        Self::check("potes", response).await?;
        Ok(())
    }
}

#[async_trait]
impl WinningNumberStore for RestStore {
    async fn get_latest(&self, mode: GameMode) -> Result<Option<WinningNumbers>> {
        Ok(self
            .latest_result_row(mode)
            .await?
            .map(|row| WinningNumbers::from_tokens(row.numeros_ganadores)))
    }

    async fn replace(&self, mode: GameMode, numbers: &WinningNumbers) -> Result<()> {
        let table = results_table(mode);

        // Delete-latest-then-insert; the draw is never patched in place.
        if let Some(latest) = self.latest_result_row(mode).await? {
            let response = self
                .request(Method::DELETE, table)
                .query(&[("id", format!("eq.{}", latest.id))])
                .send()
                .await?;
            Self::check(table, response).await?;
        }

        if !numbers.is_empty() {
            let response = self
                .request(Method::POST, table)
                .json(&json!({ "numeros_ganadores": numbers.to_vec() }))
                .send()
                .await?;
            Self::check(table, response).await?;
        }
        Ok(())
    }
}
