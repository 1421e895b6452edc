/*
Module: mappers

Declares mapper submodules beyond NROM (which lives directly in
`crate::mapper` as the baseline implementation). Concrete cartridge
mappers live in their own files for clarity.

Implemented:
- UNROM (Mapper 2)
*/

pub mod unrom;

pub use unrom::Unrom;
