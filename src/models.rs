// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GastosError {
    #[error("Unknown currency '{0}', expected ARS or USD")]
    UnknownMoneda(String),
    #[error("Unknown card type '{0}', expected visa, mastercard, amex or other")]
    UnknownCardKind(String),
    #[error("Unknown savings kind '{0}', expected pesos or usd")]
    UnknownSavingsKind(String),
    #[error("Installments must be between 1 and 120, got {0}")]
    InvalidCuotas(i64),
    #[error("Closing day must be between 1 and 31, got {0}")]
    InvalidCierre(i64),
    #[error("Card digits must be up to 4 numbers, got '{0}'")]
    InvalidDigitos(String),
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("{0} is required")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Moneda {
    Ars,
    Usd,
}

impl Moneda {
    pub fn as_str(&self) -> &'static str {
        match self {
            Moneda::Ars => "ARS",
            Moneda::Usd => "USD",
        }
    }
}

impl fmt::Display for Moneda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Moneda {
    type Err = GastosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ARS" | "PESOS" => Ok(Moneda::Ars),
            "USD" => Ok(Moneda::Usd),
            other => Err(GastosError::UnknownMoneda(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Visa,
    Mastercard,
    Amex,
    Other,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Visa => "visa",
            CardKind::Mastercard => "mastercard",
            CardKind::Amex => "amex",
            CardKind::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardKind::Visa => "VISA",
            CardKind::Mastercard => "MASTERCARD",
            CardKind::Amex => "AMEX",
            CardKind::Other => "TARJETA",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardKind {
    type Err = GastosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "visa" => Ok(CardKind::Visa),
            "mastercard" => Ok(CardKind::Mastercard),
            "amex" => Ok(CardKind::Amex),
            "other" => Ok(CardKind::Other),
            other => Err(GastosError::UnknownCardKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsKind {
    Pesos,
    Usd,
}

impl SavingsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavingsKind::Pesos => "pesos",
            SavingsKind::Usd => "usd",
        }
    }

    pub fn moneda(&self) -> Moneda {
        match self {
            SavingsKind::Pesos => Moneda::Ars,
            SavingsKind::Usd => Moneda::Usd,
        }
    }

    /// Settings key holding the running balance for this kind.
    pub fn balance_key(&self) -> &'static str {
        match self {
            SavingsKind::Pesos => "ahorro_pesos",
            SavingsKind::Usd => "ahorro_usd",
        }
    }
}

impl fmt::Display for SavingsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SavingsKind {
    type Err = GastosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pesos" | "ars" => Ok(SavingsKind::Pesos),
            "usd" => Ok(SavingsKind::Usd),
            other => Err(GastosError::UnknownSavingsKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tarjeta {
    pub id: i64,
    pub nombre: String,
    pub tipo: CardKind,
    pub banco: Option<String>,
    pub digitos: Option<String>,
    pub cierre: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Categoria {
    pub id: i64,
    pub nombre: String,
    pub icono: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub nombre: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gasto {
    pub id: i64,
    pub tarjeta_id: Option<i64>,
    pub categoria_id: Option<i64>,
    pub descripcion: String,
    pub monto: Decimal,
    pub moneda: Moneda,
    pub cuotas: u32,
    pub cuota_actual: u32,
    pub fecha: NaiveDate,
    pub mes_facturacion: String, // YYYY-MM
    pub es_fijo: bool,
    pub tag_ids: Vec<i64>,
    pub pagado: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Impuesto {
    pub id: i64,
    pub tarjeta_id: Option<i64>,
    pub descripcion: String,
    pub monto: Decimal, // always ARS
    pub mes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub id: i64,
    pub nombre: String,
    pub icono: String,
    pub objetivo: Decimal,
    pub progreso: Decimal,
    pub moneda: Moneda,
    pub completada: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movimiento {
    pub id: i64,
    pub tipo: SavingsKind,
    pub monto: Decimal, // signed: deposits positive, withdrawals negative
    pub descripcion: Option<String>,
    pub fecha: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub nombre: String,
    pub email: String,
    pub budget_ars: Decimal,
    pub budget_usd: Decimal,
    pub ahorro_pesos: Decimal,
    pub ahorro_usd: Decimal,
}

pub const MAX_CUOTAS: i64 = 120;

pub fn validate_cuotas(n: i64) -> Result<u32, GastosError> {
    if !(1..=MAX_CUOTAS).contains(&n) {
        return Err(GastosError::InvalidCuotas(n));
    }
    Ok(n as u32)
}

pub fn validate_cierre(day: i64) -> Result<u32, GastosError> {
    if !(1..=31).contains(&day) {
        return Err(GastosError::InvalidCierre(day));
    }
    Ok(day as u32)
}

pub fn validate_digitos(s: &str) -> Result<String, GastosError> {
    let s = s.trim();
    if s.is_empty() || s.len() > 4 || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(GastosError::InvalidDigitos(s.to_string()));
    }
    Ok(s.to_string())
}

pub fn validate_positive(amount: Decimal) -> Result<Decimal, GastosError> {
    if amount <= Decimal::ZERO {
        return Err(GastosError::NonPositiveAmount(amount));
    }
    Ok(amount)
}
