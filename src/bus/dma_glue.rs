//! DMA glue: wires `Ppu` to the `OamWriter` trait used by `DmaController`.

impl crate::bus::dma::OamWriter for crate::ppu::Ppu {
    #[inline]
    fn write_oam_data(&mut self, value: u8) {
        // Equivalent to CPU writing $2004 (OAMDATA)
        self.write_reg(0x2004, value);
    }
}
