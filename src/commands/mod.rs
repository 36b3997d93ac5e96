// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod tarjetas;
pub mod categorias;
pub mod tags;
pub mod gastos;
pub mod impuestos;
pub mod metas;
pub mod ahorros;
pub mod dashboard;
pub mod proyeccion;
pub mod config;
pub mod month;
pub mod dolar;
pub mod importer;
pub mod exporter;
pub mod doctor;
